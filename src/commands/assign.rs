use anyhow::Result;

use rfcdesk::command::PicAssignment;
use rfcdesk::models::Actor;

use super::Desk;

pub fn run(desk: &mut Desk, id: &str, actor: &Actor, assignment: PicAssignment) -> Result<()> {
    let rfc = desk.assign_to_pic(id, actor, assignment)?;
    println!(
        "Assigned {} to {}",
        rfc.id,
        rfc.assigned_pic().unwrap_or("(nobody)")
    );
    if rfc.signature_pending() {
        println!("Category '{}' needs a digital signature (TTE) before work starts", rfc.category);
    }
    Ok(())
}
