use anyhow::{bail, Result};
use chrono::NaiveDate;

use rfcdesk::models::{Actor, Priority, SprintPlan, SprintTask};

use super::Desk;

/// Parse a `--task` value: `description:estimate[:priority[:assignee]]`.
pub fn parse_task(input: &str) -> Result<SprintTask> {
    let mut parts = input.splitn(4, ':').map(str::trim);
    let description = parts.next().unwrap_or_default();
    let estimate = parts.next().unwrap_or_default();
    if description.is_empty() || estimate.is_empty() {
        bail!(
            "Invalid task '{}'. Expected description:estimate[:priority[:assignee]]",
            input
        );
    }
    let priority = match parts.next() {
        Some(p) if !p.is_empty() => p.parse::<Priority>().map_err(anyhow::Error::msg)?,
        _ => Priority::default(),
    };
    let assignee = parts
        .next()
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    Ok(SprintTask {
        description: description.to_string(),
        estimate: estimate.to_string(),
        priority,
        assignee,
    })
}

pub struct SprintArgs<'a> {
    pub name: &'a str,
    pub goal: &'a str,
    pub start: NaiveDate,
    pub duration: &'a str,
    pub team: &'a [String],
    pub tasks: &'a [String],
}

pub fn run(desk: &mut Desk, id: &str, actor: &Actor, args: SprintArgs<'_>) -> Result<()> {
    let tasks = args
        .tasks
        .iter()
        .map(|t| parse_task(t))
        .collect::<Result<Vec<_>>>()?;

    let plan = SprintPlan {
        name: args.name.to_string(),
        start_date: args.start,
        duration: args.duration.to_string(),
        goal: args.goal.to_string(),
        team: args.team.to_vec(),
        tasks,
    };

    let rfc = desk.create_sprint(id, actor, plan)?;
    let open = rfc.timeline.iter().filter(|s| !s.completed).count();
    println!("Started sprint on {} with {} open step(s)", rfc.id, open);
    Ok(())
}
