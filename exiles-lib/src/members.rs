//! Membership cohorts: member and active-member counts per owner.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use exiles_db::queries;
use exiles_model::{MembershipCohort, OwnerId, OwnerKind};

use crate::context::Context;
use crate::error::EngineError;

/// Which characters form their own one-member cohort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CharacterScope {
    /// Characters whose guild column is null.
    #[default]
    Ungrouped,
    /// Every character not counted as a member of an existing guild. This
    /// also picks up characters whose guild row no longer exists.
    Deduplicated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberOptions {
    /// Activity window. `None` skips active-member counting.
    pub threshold: Option<Duration>,
    /// End of the activity window. Defaults to the dataset "now".
    pub reference_time: Option<DateTime<Utc>>,
    /// Only report owners that own at least one building row.
    pub only_with_buildings: bool,
    pub characters: CharacterScope,
}

impl Default for MemberOptions {
    fn default() -> Self {
        Self {
            threshold: None,
            reference_time: None,
            only_with_buildings: true,
            characters: CharacterScope::default(),
        }
    }
}

pub struct MembersManager<'a> {
    ctx: &'a Context,
}

impl<'a> MembersManager<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// One cohort per guild and per stand-alone character.
    ///
    /// A character is active when its last login is at or after
    /// `reference_time - threshold`. Guilds without an active member get an
    /// explicit zero.
    pub fn members(
        &self,
        options: &MemberOptions,
    ) -> Result<BTreeMap<OwnerId, MembershipCohort>, EngineError> {
        let since = match options.threshold {
            Some(threshold) if threshold < Duration::zero() => {
                return Err(EngineError::invalid_input(format!(
                    "activity threshold must not be negative, got {threshold}"
                )));
            }
            Some(threshold) => {
                let reference = self.ctx.reference_time(options.reference_time)?;
                let since = reference
                    .checked_sub_signed(threshold)
                    .map_or(i64::MIN, |t| t.timestamp());
                Some(since)
            }
            None => None,
        };

        let conn = self.ctx.game();
        let builders = if options.only_with_buildings {
            Some(queries::building_owner_ids(conn)?)
        } else {
            None
        };
        let keep = |id: OwnerId| builders.as_ref().is_none_or(|set| set.contains(&id));

        let mut cohorts = BTreeMap::new();
        for guild in queries::guild_member_counts(conn)? {
            if !keep(guild.guild_id) {
                continue;
            }
            cohorts.insert(
                guild.guild_id,
                MembershipCohort {
                    name: guild.name,
                    kind: OwnerKind::Guild,
                    num_members: guild.members as u32,
                    num_active_members: since.map(|_| 0),
                },
            );
        }

        if let Some(since) = since {
            for (guild_id, active) in queries::guild_active_member_counts(conn, since)? {
                if let Some(cohort) = cohorts.get_mut(&guild_id) {
                    cohort.num_active_members = Some(active as u32);
                }
            }
        }

        for row in queries::character_memberships(conn)? {
            let standalone = match options.characters {
                CharacterScope::Ungrouped => row.guild_id.is_none(),
                CharacterScope::Deduplicated => row.guild_id.is_none() || !row.guild_exists,
            };
            if !standalone || !keep(row.id) {
                continue;
            }
            if cohorts.contains_key(&row.id) {
                log::warn!(
                    "Character {} shares id {} with a guild, keeping the guild cohort",
                    row.name,
                    row.id
                );
                continue;
            }
            let active = since.map(|since| u32::from(row.last_login.is_some_and(|t| t >= since)));
            cohorts.insert(
                row.id,
                MembershipCohort {
                    name: row.name,
                    kind: OwnerKind::Character,
                    num_members: 1,
                    num_active_members: active,
                },
            );
        }

        log::debug!("Collected {} membership cohorts", cohorts.len());
        Ok(cohorts)
    }
}
