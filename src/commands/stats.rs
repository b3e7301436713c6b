use anyhow::Result;

use rfcdesk::view::DashboardStats;

use super::Desk;

pub fn run(desk: &Desk) -> Result<()> {
    print!("{}", render(&desk.stats()?));
    Ok(())
}

fn render(stats: &DashboardStats) -> String {
    format!(
        "Total RFCs:      {}\n\
         In progress:     {}\n\
         Pending TTE:     {}\n\
         Completed:       {}\n\
         Rejected:        {}\n\
         High priority:   {}\n",
        stats.total,
        stats.in_progress,
        stats.pending_tte,
        stats.completed,
        stats.rejected,
        stats.high_priority
    )
}
