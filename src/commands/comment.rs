use anyhow::Result;

use rfcdesk::models::Actor;

use super::Desk;

pub fn run(desk: &mut Desk, id: &str, actor: &Actor, message: &str) -> Result<()> {
    let rfc = desk.add_comment(id, actor, message)?;
    println!("Added comment to {}", rfc.id);
    Ok(())
}
