// Copyright 2026 profstore Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io::Write;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use clap::{Args, Subcommand};
use profstore::{KvBackend, ListOrder, ListQuery, ProfileId, ProfileStore};

use crate::error::{Error, Result};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List live records, newest first.
    List(ListArgs),
    /// Print a record as JSON.
    Show {
        /// Record id.
        id: ProfileId,
    },
    /// Print the ids a user has not viewed yet.
    Unviewed {
        /// User label.
        user: String,
    },
    /// Mark records as viewed by a user.
    Viewed {
        /// User label.
        user: String,
        /// Record ids.
        #[arg(required = true)]
        ids: Vec<ProfileId>,
    },
    /// Remove expired records now.
    Sweep,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Maximum count of listed records.
    #[arg(long, default_value_t = 20)]
    max: usize,

    /// Only records that started after, as a RFC 3339 timestamp or a duration ago.
    #[arg(long, value_parser = parse_time)]
    since: Option<DateTime<Utc>>,

    /// Only records that started before, as a RFC 3339 timestamp or a duration ago.
    #[arg(long, value_parser = parse_time)]
    until: Option<DateTime<Utc>>,

    /// Oldest first.
    #[arg(long)]
    asc: bool,
}

impl ListArgs {
    fn query(&self) -> ListQuery {
        let mut query = ListQuery::new(self.max);
        query.since = self.since;
        query.until = self.until;
        if self.asc {
            query.order = ListOrder::Ascending;
        }
        query
    }
}

/// Parse `2026-10-16T08:00:00Z`, or `2h` as two hours ago.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(s) {
        return Ok(time.with_timezone(&Utc));
    }
    let invalid = || Error::InvalidTime(s.to_string());
    let ago = humantime::parse_duration(s).map_err(|_| invalid())?;
    let ago = TimeDelta::from_std(ago).map_err(|_| invalid())?;
    Utc::now().checked_sub_signed(ago).ok_or_else(invalid)
}

pub async fn run<B: KvBackend>(store: &ProfileStore<B>, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::List(args) => {
            for id in store.try_list(&args.query()).await? {
                // Expired between list and load.
                let Some(profile) = store.try_load(id).await? else {
                    continue;
                };
                writeln!(
                    out,
                    "{}  {}  {}",
                    profile.id,
                    profile.started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                    profile.name
                )?;
            }
        }
        Command::Show { id } => {
            let profile = store.try_load(id).await?.ok_or(Error::NotFound(id))?;
            serde_json::to_writer_pretty(&mut *out, &profile)?;
            writeln!(out)?;
        }
        Command::Unviewed { user } => {
            for id in store.try_get_unviewed_ids(&user).await? {
                writeln!(out, "{id}")?;
            }
        }
        Command::Viewed { user, ids } => {
            let count = ids.len();
            store.try_set_viewed_many(&user, ids).await?;
            writeln!(out, "marked {count} records viewed by {user}")?;
        }
        Command::Sweep => {
            let swept = store.try_sweep().await?;
            writeln!(out, "swept {swept} expired records")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use profstore::{MemoryBackend, Namespace, Profile, ProfileStoreBuilder};

    use super::*;

    fn store() -> ProfileStore<MemoryBackend> {
        ProfileStoreBuilder::new()
            .with_namespace(Namespace::new("cli"))
            .with_cache_duration(Duration::from_secs(3600))
            .build(MemoryBackend::new())
            .unwrap()
    }

    async fn output(store: &ProfileStore<MemoryBackend>, command: Command) -> String {
        let mut out = vec![];
        run(store, command, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_time() {
        let time = parse_time("2026-10-16T10:00:00+02:00").unwrap();
        assert_eq!(time.to_rfc3339(), "2026-10-16T08:00:00+00:00");

        let ago = parse_time("2h").unwrap();
        let expected = Utc::now() - TimeDelta::hours(2);
        assert!((expected - ago).abs() < TimeDelta::seconds(5));

        assert!(matches!(parse_time("yesterday"), Err(Error::InvalidTime(_))));
    }

    #[test_log::test(tokio::test)]
    async fn test_list_and_show() {
        let store = store();
        let older = Profile::new("/older").with_started_at(Utc::now() - TimeDelta::minutes(5));
        let newer = Profile::new("/newer");
        store.save(&older).await;
        store.save(&newer).await;
        store
            .save(&Profile::new("/expired").with_started_at(Utc::now() - TimeDelta::hours(2)))
            .await;

        let args = ListArgs {
            max: 10,
            since: None,
            until: None,
            asc: false,
        };
        let text = output(&store, Command::List(args)).await;
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(&newer.id.to_string()));
        assert!(lines[0].ends_with("/newer"));
        assert!(lines[1].ends_with("/older"));

        let text = output(&store, Command::Show { id: older.id }).await;
        let back: Profile = serde_json::from_str(&text).unwrap();
        assert_eq!(back, older);

        let mut out = vec![];
        let err = run(&store, Command::Show { id: ProfileId::new_v4() }, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test_log::test(tokio::test)]
    async fn test_unviewed_viewed() {
        let store = store();
        let ids = [ProfileId::new_v4(), ProfileId::new_v4()];
        for id in ids {
            store.set_unviewed("alice", id).await;
        }

        let text = output(&store, Command::Unviewed { user: "alice".to_string() }).await;
        assert_eq!(text.lines().count(), 2);

        let text = output(
            &store,
            Command::Viewed {
                user: "alice".to_string(),
                ids: ids.to_vec(),
            },
        )
        .await;
        assert_eq!(text, "marked 2 records viewed by alice\n");
        assert!(store.get_unviewed_ids("alice").await.is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_sweep() {
        let store: ProfileStore<MemoryBackend> = ProfileStoreBuilder::new()
            .with_cache_duration(Duration::from_secs(3600))
            .with_sweep_interval(Duration::from_secs(3600))
            .build(MemoryBackend::new())
            .unwrap();
        // Consume the first sweep.
        store.list(&ListQuery::new(1)).await;

        for i in 0..3 {
            let started_at = Utc::now() - TimeDelta::hours(2) - TimeDelta::seconds(i);
            store.save(&Profile::new("/old").with_started_at(started_at)).await;
        }
        assert_eq!(output(&store, Command::Sweep).await, "swept 3 expired records\n");
    }
}
