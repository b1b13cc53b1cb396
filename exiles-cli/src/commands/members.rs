use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use exiles_lib::{MemberOptions, MembersManager};
use exiles_model::OwnerKind;

use super::{or_dash, threshold_from_days};
use crate::CliError;

pub(crate) fn run_members(
    saved_dir: Option<PathBuf>,
    threshold_days: Option<i64>,
    all: bool,
) -> Result<(), CliError> {
    let threshold = threshold_days.map(threshold_from_days).transpose()?;
    let ctx = crate::open_context(saved_dir)?;
    let options = MemberOptions {
        threshold,
        only_with_buildings: !all,
        ..MemberOptions::default()
    };
    let cohorts = MembersManager::new(&ctx).members(&options)?;

    log::info!(
        "{}",
        "Members by owner".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!(
        "  {:>10}  {:<9} {:<32} {:>7} {:>7}",
        "Owner",
        "Kind",
        "Name",
        "Members",
        "Active"
    );
    for (owner_id, cohort) in &cohorts {
        let kind = match cohort.kind {
            OwnerKind::Guild => "guild",
            OwnerKind::Character => "character",
        };
        let line = format!(
            "  {:>10}  {:<9} {:<32} {:>7} {:>7}",
            owner_id,
            kind,
            cohort.name,
            cohort.num_members,
            or_dash(cohort.num_active_members),
        );
        if threshold_days.is_some() && !cohort.is_active() {
            log::info!("{}", line.if_supports_color(Stdout, |t| t.dimmed()));
        } else {
            log::info!("{}", line);
        }
    }

    crate::log_blank();
    let members: u32 = cohorts.values().map(|c| c.num_members).sum();
    log::info!("Total: {} owners, {} members", cohorts.len(), members);
    if threshold_days.is_some() {
        let active = cohorts.values().filter(|c| c.is_active()).count();
        log::info!("Active owners: {}", active);
    }
    Ok(())
}
