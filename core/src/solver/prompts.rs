//! Prompt assembly for the planning nodes and the executor task text.

use crate::agent::StepRecord;
use crate::solver::Plan;
use crate::traits::ToolSpec;

/// Today's date the way the planner prompt presents it.
pub fn today() -> String {
    chrono::Local::now().format("%a %b %-d, %Y").to_string()
}

/// Numbered tool catalog embedded in both planning prompts.
pub fn render_catalog(specs: &[ToolSpec]) -> String {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| format!("{}. **{}**: {}", i + 1, spec.name, spec.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Executed steps rendered for the replanner, each pairing the tool calls a
/// turn issued with the results that came back.
pub fn render_past_steps(records: &[StepRecord]) -> String {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "{}. {} and result was\n{}\n",
                i + 1,
                record.describe_calls(),
                record.results.join("\n")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Task text handed to the function-calling loop for one execution round.
pub fn execute_task(plan: &Plan) -> String {
    format!(
        "For the following plan: {}\n\nYou are tasked with executing these steps above.",
        plan.render_numbered()
    )
}

pub fn planner_prompt(date: &str, catalog: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "You are a task planner agent. For context, today's date is {}.\n",
        date
    ));
    prompt.push_str(
        "You will be given a user request with an objective. Your goal is to create a to do \
         list which consists in a step by step plan. The plan should involve individual \
         tasks that, if executed correctly, yield the correct answer. Do not add any \
         superfluous steps.\n",
    );
    prompt.push_str(
        "The final step must call plan_complete. Make sure that each step has all the \
         information needed and tool dependencies are managed properly - do not skip \
         steps.\n\n",
    );
    prompt.push_str("<Available Tools>\n");
    prompt.push_str(catalog);
    prompt.push_str("\n</Available Tools>\n\n");
    prompt.push_str(
        "Provide the plan as a JSON object with a steps key holding the ordered list of \
         step descriptions, each step naming one available tool. Return only the JSON plan.",
    );
    prompt
}

pub fn replanner_prompt(objective: &str, plan: &str, past_steps: &str, catalog: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are a task planner agent reviewing a plan in progress. You will be given the \
         user's objective, the initial plan you created, and the steps executed so far \
         together with their results.\n",
    );
    prompt.push_str(
        "Propose an updated plan holding only the steps that still NEED to be done. Steps \
         already successfully completed must not appear again. Each remaining step must \
         repeat ALL the data it requires in its description. If all steps were completed, \
         return a single-step plan that only calls plan_complete.\n\n",
    );
    prompt.push_str(&format!(
        "The user request and objective was this:\n\n{}\n\n",
        objective
    ));
    prompt.push_str(&format!(
        "Your original plan to fulfill the user request was this:\n\n{}\n\n",
        plan
    ));
    prompt.push_str(&format!(
        "You have currently done the following steps:\n\n{}\n\n",
        past_steps
    ));
    prompt.push_str("<Available Tools>\n");
    prompt.push_str(catalog);
    prompt.push_str("\n</Available Tools>\n\n");
    prompt.push_str(
        "Provide the updated plan as a JSON object with a steps key holding the ordered \
         list of remaining step descriptions. Return only the JSON plan.",
    );
    prompt
}
