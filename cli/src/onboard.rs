use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use stride_core::config::Config;

const BANNER: &str = r"
    -------------------------------------

    ███████╗████████╗██████╗ ██╗██████╗ ███████╗
    ██╔════╝╚══██╔══╝██╔══██╗██║██╔══██╗██╔════╝
    ███████╗   ██║   ██████╔╝██║██║  ██║█████╗
    ╚════██║   ██║   ██╔══██╗██║██║  ██║██╔══╝
    ███████║   ██║   ██║  ██║██║██████╔╝███████╗
    ╚══════╝   ╚═╝   ╚═╝  ╚═╝╚═╝╚═════╝ ╚══════╝

    -------------------------------------
";

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_provider() -> Result<String> {
    let providers = vec!["openai", "openrouter", "ollama"];

    let selection = Select::new()
        .with_prompt("Select your provider")
        .items(&providers)
        .default(0)
        .interact()
        .context("Failed to select provider")?;

    Ok(providers[selection].to_string())
}

fn setup_api_key(provider: &str) -> Result<String> {
    let api_key: String = Input::new()
        .with_prompt(format!("Enter your {} API key", provider))
        .interact_text()
        .context("Failed to read API key")?;

    if api_key.is_empty() {
        return Err(anyhow::anyhow!("API key cannot be empty"));
    }

    Ok(api_key)
}

fn default_model(provider: &str) -> &'static str {
    match provider {
        "openrouter" => "openai/gpt-4o",
        "ollama" => "granite4:small-h",
        _ => "gpt-4o",
    }
}

fn setup_model(provider: &str) -> Result<String> {
    let model: String = Input::new()
        .with_prompt("Model")
        .default(default_model(provider).to_string())
        .interact_text()
        .context("Failed to read model")?;

    Ok(model)
}

fn setup_optional_key(prompt: &str) -> Result<String> {
    let key: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .context("Failed to read key")?;

    Ok(key)
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to Stride!").white().bold());
    println!(
        "  {}",
        style("This wizard will configure your planner in under 30 seconds.").dim()
    );
    println!();

    print_step(1, 4, "Provider Selection");
    let provider = setup_provider()?;

    print_step(2, 4, "API Key Setup");
    let api_key = if provider == "ollama" {
        println!(
            "  {}",
            style("Ollama runs locally, no API key needed.").dim()
        );
        String::new()
    } else {
        setup_api_key(&provider)?
    };

    print_step(3, 4, "Model Selection");
    let model = setup_model(&provider)?;

    print_step(4, 4, "Tool API Keys (optional)");
    println!(
        "  {}",
        style("Leave empty to run the weather and stock tools on canned demo data.").dim()
    );
    let weather_api_key = setup_optional_key("OpenWeatherMap API key")?;
    let stock_api_key = setup_optional_key("Alpha Vantage API key")?;

    let config = Config {
        provider: Some(provider),
        api_key,
        model,
        weather_api_key,
        stock_api_key,
        ..Default::default()
    };

    if let Err(e) = std::fs::create_dir_all(&config.artifacts_dir) {
        eprintln!(
            "  {} Warning: Could not create artifacts directory: {}",
            style("!").yellow(),
            e
        );
    } else {
        println!(
            "  {} Artifacts directory ready at {}",
            style("✓").green(),
            style(config.artifacts_dir.display()).cyan()
        );
    }

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(stride_core::config::get_config_path().display()).cyan()
    );
    println!();
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("stride run -o \"compare weather forecast for Toronto and Montréal\"")
            .cyan()
            .bold()
    );
    println!();

    Ok(config)
}
