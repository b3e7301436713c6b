use anyhow::Result;

use rfcdesk::command::NewRfc;
use rfcdesk::models::Actor;

use super::Desk;

/// Create an RFC and send it for review. Returns the new id.
pub fn run(desk: &mut Desk, actor: &Actor, form: NewRfc) -> Result<String> {
    let rfc = desk.submit_rfc(actor, form)?;
    println!("Submitted {}: {}", rfc.id, rfc.title);
    println!("Status: {}", rfc.status);
    Ok(rfc.id)
}

pub fn run_draft(desk: &mut Desk, actor: &Actor, form: NewRfc) -> Result<String> {
    let rfc = desk.save_draft(actor, form)?;
    println!("Saved draft {}: {}", rfc.id, rfc.title);
    Ok(rfc.id)
}

/// Submit a previously saved draft.
pub fn run_send(desk: &mut Desk, id: &str, actor: &Actor) -> Result<()> {
    let rfc = desk.submit_draft(id, actor)?;
    println!("Submitted {}: {}", rfc.id, rfc.title);
    Ok(())
}
