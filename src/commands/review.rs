use anyhow::Result;

use rfcdesk::command::{Review, RfcPatch};
use rfcdesk::models::Actor;

use super::Desk;

pub fn run_approve(desk: &mut Desk, id: &str, actor: &Actor, review: Review) -> Result<()> {
    let rfc = desk.approve_rfc(id, actor, review)?;
    println!("Approved {}", rfc.id);
    println!("Status: {}", rfc.status);
    Ok(())
}

pub fn run_reject(desk: &mut Desk, id: &str, actor: &Actor, reason: &str) -> Result<()> {
    let rfc = desk.reject_rfc(id, actor, reason)?;
    println!("Rejected {}", rfc.id);
    Ok(())
}

pub fn run_request_changes(desk: &mut Desk, id: &str, actor: &Actor, reason: &str) -> Result<()> {
    let rfc = desk.request_modification(id, actor, reason)?;
    println!("Requested changes on {}", rfc.id);
    Ok(())
}

pub fn run_resubmit(desk: &mut Desk, id: &str, actor: &Actor, patch: RfcPatch) -> Result<()> {
    let rfc = desk.resubmit_rfc(id, actor, patch)?;
    println!("Resubmitted {}", rfc.id);
    Ok(())
}
