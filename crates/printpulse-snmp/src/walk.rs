// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Column walker: reads one table column as an ordered index -> value list.
//
// v2c pages with GETBULK (non-repeaters 0, max-repetitions 12). v1 has no bulk
// primitive, so it steps with GETNEXT. Either way the walk ends, without
// error, at the first binding outside the column, at the row cap, or when the
// agent signals end of view.

use async_snmp::{Oid, Value, VarBind};
use tracing::debug;

use crate::error::Result;
use crate::oid::index_after;
use crate::session::{Session, SnmpClient, Version};

/// max-repetitions used for each GETBULK page.
pub const BULK_MAX_REPETITIONS: u32 = 12;

/// Rows of one column in the order the agent returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    rows: Vec<(Vec<u32>, Value)>,
}

impl Column {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: Vec<u32>, value: Value) {
        self.rows.push((index, value));
    }

    /// Value at `index`, first match wins.
    pub fn get(&self, index: &[u32]) -> Option<&Value> {
        self.rows
            .iter()
            .find(|(i, _)| i.as_slice() == index)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u32], &Value)> {
        self.rows.iter().map(|(i, v)| (i.as_slice(), v))
    }

    pub fn indices(&self) -> impl Iterator<Item = &[u32]> {
        self.rows.iter().map(|(i, _)| i.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(Vec<u32>, Value)> for Column {
    fn from_iter<I: IntoIterator<Item = (Vec<u32>, Value)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

/// Walk the column rooted at `base`, keeping at most `max_rows` rows.
///
/// Each page is recorded in the order the agent sent it. Another page is
/// requested only when the last binding moved past the cursor. Device and
/// transport errors mid-walk are returned as errors; running off the end of
/// the column is not.
pub async fn walk_column<C: SnmpClient>(
    session: &Session<C>,
    base: &Oid,
    max_rows: usize,
) -> Result<Column> {
    let mut column = Column::new();
    let mut cursor = base.clone();

    'pages: while column.len() < max_rows {
        let Some(batch) = next_batch(session, &cursor).await? else {
            break;
        };

        let mut last = None;
        for VarBind { oid, value } in batch {
            if matches!(value, Value::EndOfMibView) {
                break 'pages;
            }
            let Some(index) = index_after(&oid, base) else {
                break 'pages;
            };
            column.push(index, value);
            if column.len() >= max_rows {
                break 'pages;
            }
            last = Some(oid);
        }

        // An agent answering at or before the cursor would otherwise loop
        // forever.
        match last {
            Some(last) if last > cursor => cursor = last,
            _ => {
                debug!(base = %base, cursor = %cursor, "agent did not advance, ending walk");
                break;
            }
        }
    }

    debug!(base = %base, rows = column.len(), version = %session.version(), "column walked");
    Ok(column)
}

/// One page of bindings after `cursor`, or `None` once a v1 agent reports
/// the end of its MIB.
async fn next_batch<C: SnmpClient>(
    session: &Session<C>,
    cursor: &Oid,
) -> Result<Option<Vec<VarBind>>> {
    match session.version() {
        Version::V2c => session
            .get_bulk(cursor, BULK_MAX_REPETITIONS)
            .await
            .map(Some),
        Version::V1 => match session.get_next(cursor).await {
            Ok(vb) => Ok(Some(vec![vb])),
            Err(e) if e.is_no_such_name() => Ok(None),
            Err(e) => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid::{cell, columns};
    use crate::session::Auth;
    use crate::testing::{FakeAgent, RequestKind};
    use crate::value::to_text;
    use async_snmp::ErrorStatus;

    fn supply_levels(agent: FakeAgent, rows: u32) -> FakeAgent {
        (1..=rows).fold(agent, |agent, i| {
            let level = i32::try_from(i * 10).expect("level");
            agent.with_cell(columns::SUPPLY_LEVEL, &[1, i], Value::Integer(level))
        })
    }

    fn binding(column: &[u32], index: &[u32], value: &str) -> VarBind {
        VarBind::new(cell(column, index), Value::from(value))
    }

    fn texts(column: &Column) -> Vec<String> {
        column.iter().map(|(_, v)| to_text(v)).collect()
    }

    #[tokio::test]
    async fn walks_across_several_bulk_pages() {
        let agent = supply_levels(FakeAgent::new(), 30);
        let session = Session::new(agent.client(Auth::v2c("public")));

        let column = walk_column(&session, &Oid::from(columns::SUPPLY_LEVEL), 64)
            .await
            .expect("walk");

        assert_eq!(column.len(), 30);
        let indices: Vec<Vec<u32>> = column.indices().map(<[u32]>::to_vec).collect();
        let expected: Vec<Vec<u32>> = (1..=30).map(|i| vec![1, i]).collect();
        assert_eq!(indices, expected);
        assert_eq!(column.get(&[1, 7]), Some(&Value::Integer(70)));
        assert!(
            agent
                .requests()
                .iter()
                .all(|r| r.kind == RequestKind::GetBulk)
        );
    }

    #[tokio::test]
    async fn stops_at_first_row_outside_the_column() {
        let base = Oid::from(columns::SUPPLY_DESCRIPTION);
        let agent = FakeAgent::new().script(
            base.clone(),
            vec![
                binding(columns::SUPPLY_DESCRIPTION, &[1, 1], "Black Toner"),
                binding(columns::SUPPLY_DESCRIPTION, &[1, 2], "Cyan Toner"),
                binding(columns::SUPPLY_DESCRIPTION, &[1, 3], "Drum"),
                VarBind::new(cell(columns::SUPPLY_MAX_CAPACITY, &[1, 1]), Value::Integer(100)),
                binding(columns::SUPPLY_DESCRIPTION, &[1, 4], "late row"),
            ],
        );
        let session = Session::new(agent.client(Auth::v2c("public")));

        let column = walk_column(&session, &base, 20).await.expect("walk");
        assert_eq!(texts(&column), ["Black Toner", "Cyan Toner", "Drum"]);
        assert_eq!(agent.requests().len(), 1);
    }

    #[tokio::test]
    async fn keeps_device_order_within_a_page() {
        let base = Oid::from(columns::ALERT_DESCRIPTION);
        let agent = FakeAgent::new().script(
            base.clone(),
            vec![
                binding(columns::ALERT_DESCRIPTION, &[1, 3], "c"),
                binding(columns::ALERT_DESCRIPTION, &[1, 1], "a"),
                binding(columns::ALERT_DESCRIPTION, &[1, 2], "b"),
                binding(columns::CONSOLE_DISPLAY_TEXT, &[1, 1], "Ready"),
            ],
        );
        let session = Session::new(agent.client(Auth::v2c("public")));

        let column = walk_column(&session, &base, 20).await.expect("walk");
        assert_eq!(texts(&column), ["c", "a", "b"]);
    }

    #[tokio::test]
    async fn page_ending_behind_the_cursor_is_kept_then_ends_walk() {
        let base = Oid::from(columns::ALERT_DESCRIPTION);
        let agent = FakeAgent::new()
            .script(
                base.clone(),
                vec![
                    binding(columns::ALERT_DESCRIPTION, &[1, 1], "first"),
                    binding(columns::ALERT_DESCRIPTION, &[1, 2], "second"),
                ],
            )
            .script(
                cell(columns::ALERT_DESCRIPTION, &[1, 2]),
                vec![
                    binding(columns::ALERT_DESCRIPTION, &[1, 3], "third"),
                    binding(columns::ALERT_DESCRIPTION, &[1, 1], "first again"),
                ],
            );
        let session = Session::new(agent.client(Auth::v2c("public")));

        let column = walk_column(&session, &base, 20).await.expect("walk");
        assert_eq!(texts(&column), ["first", "second", "third", "first again"]);
        assert_eq!(column.get(&[1, 3]).map(to_text).as_deref(), Some("third"));
        // The second page did not advance, so no third request.
        assert_eq!(agent.requests().len(), 2);
    }

    #[tokio::test]
    async fn row_cap_truncates() {
        let agent = supply_levels(FakeAgent::new(), 20);
        let session = Session::new(agent.client(Auth::v2c("public")));

        let column = walk_column(&session, &Oid::from(columns::SUPPLY_LEVEL), 8)
            .await
            .expect("walk");
        assert_eq!(column.len(), 8);
        assert_eq!(agent.requests().len(), 1);
    }

    #[tokio::test]
    async fn v1_steps_with_get_next_until_no_such_name() {
        let agent = supply_levels(FakeAgent::new(), 3);
        let session = Session::new(agent.client(Auth::v1("public")));

        let column = walk_column(&session, &Oid::from(columns::SUPPLY_LEVEL), 20)
            .await
            .expect("walk");
        assert_eq!(column.len(), 3);

        let requests = agent.requests();
        // Three rows, then the request that ran off the end of the MIB.
        assert_eq!(requests.len(), 4);
        assert!(requests.iter().all(|r| r.kind == RequestKind::GetNext));
    }

    #[tokio::test]
    async fn end_of_mib_view_ends_walk() {
        let agent = supply_levels(FakeAgent::new(), 2);
        let session = Session::new(agent.client(Auth::v2c("public")));

        let column = walk_column(&session, &Oid::from(columns::SUPPLY_LEVEL), 20)
            .await
            .expect("walk");
        assert_eq!(column.len(), 2);
    }

    #[tokio::test]
    async fn looping_agent_is_cut_off() {
        let base = Oid::from(columns::CONSOLE_DISPLAY_TEXT);
        let first = binding(columns::CONSOLE_DISPLAY_TEXT, &[1, 1], "Ready");
        let agent = FakeAgent::new()
            .script(base.clone(), vec![first.clone()])
            .script(first.oid.clone(), vec![first.clone()]);
        let session = Session::new(agent.client(Auth::v2c("public")));

        let column = walk_column(&session, &base, 20).await.expect("walk");
        // The repeated page is recorded once more, then the walk stops.
        assert_eq!(texts(&column), ["Ready", "Ready"]);
        assert_eq!(agent.requests().len(), 2);
    }

    #[tokio::test]
    async fn device_error_mid_walk_is_an_error() {
        let agent = supply_levels(FakeAgent::new(), 3)
            .fail_under(columns::SUPPLY_LEVEL, ErrorStatus::GenErr);
        let session = Session::new(agent.client(Auth::v2c("public")));

        let err = walk_column(&session, &Oid::from(columns::SUPPLY_LEVEL), 20)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "genErr at index 1");
    }
}
