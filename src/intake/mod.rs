//! Message intake pipeline: classify, gate, plan, reply.
//!
//! Ties the parser, usage gate, and planner together the way the original
//! bot's message handler did, and renders its Japanese reply texts. The
//! pipeline holds no per-user state; session continuity (which template a
//! user is on, their account record) is the caller's concern and arrives
//! as arguments on every call.

use serde::Serialize;
use tracing::info;

use crate::planner::{CellPlanner, CellWrite, CompanyUpdate, PlanError, WritePlan};
use crate::record::{self, FieldRecord};
use crate::sheets::Snapshot;
use crate::usage::UsageDecision;

/// What a parsed message asks the system to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Update the company name and/or date header.
    CompanyUpdate,
    /// Record a product line item.
    ProductEntry,
    /// Nothing recognizable; answer with the format help.
    Unrecognized,
}

/// Classify a record the way the original bot dispatched messages: a full
/// product triple wins over company fields; company name or date alone is
/// a header update; anything else is unrecognized.
pub fn classify(record: &FieldRecord) -> MessageKind {
    if record.has_product_fields() {
        MessageKind::ProductEntry
    } else if record.has_company_fields() {
        MessageKind::CompanyUpdate
    } else {
        MessageKind::Unrecognized
    }
}

/// Pipeline outcome, carrying planned writes and the user-facing reply.
#[derive(Debug, Clone, Serialize)]
pub enum IntakeOutcome {
    /// Company name and/or date were planned into the header ranges.
    CompanyUpdated {
        /// Writes for the collaborator to apply.
        writes: Vec<CellWrite>,
        /// Confirmation reply.
        reply: String,
    },
    /// A product line was planned into the next free row.
    ProductRecorded {
        /// The computed write plan.
        plan: WritePlan,
        /// Registration summary reply.
        reply: String,
    },
    /// The update path found no company or date value.
    NothingToUpdate {
        /// Explanatory reply.
        reply: String,
    },
    /// The message matched no recognized shape.
    Unrecognized {
        /// Format help reply.
        reply: String,
    },
    /// The usage gate denied the write.
    UsageBlocked {
        /// Limit-reached reply.
        reply: String,
    },
}

/// Stateless intake pipeline over a [`CellPlanner`].
#[derive(Debug, Clone)]
pub struct Intake {
    planner: CellPlanner,
}

impl Intake {
    /// Build the pipeline.
    pub fn new(planner: CellPlanner) -> Self {
        Self { planner }
    }

    /// The planner backing this pipeline.
    pub fn planner(&self) -> &CellPlanner {
        &self.planner
    }

    /// Handle one chat message end to end.
    ///
    /// `gate` is the pre-computed usage decision for this user; the
    /// pipeline consumes it but never records usage itself. Unrecognized
    /// messages bypass the gate — only actual writes count.
    pub fn handle_message(
        &self,
        text: &str,
        template_name: &str,
        snapshot: &Snapshot,
        gate: &UsageDecision,
    ) -> Result<IntakeOutcome, PlanError> {
        let record = record::parse(text);
        let kind = classify(&record);
        info!(?kind, template = template_name, "classified incoming message");

        if kind != MessageKind::Unrecognized {
            if let UsageDecision::LimitReached { limit } = gate {
                return Ok(IntakeOutcome::UsageBlocked {
                    reply: format!("利用制限に達しました（月{limit}件まで）"),
                });
            }
        }

        match kind {
            MessageKind::Unrecognized => Ok(IntakeOutcome::Unrecognized {
                reply: format_help(),
            }),
            MessageKind::ProductEntry => {
                let plan = self.planner.plan_writes(template_name, &record, snapshot)?;
                let reply = product_reply(&record);
                Ok(IntakeOutcome::ProductRecorded { plan, reply })
            }
            MessageKind::CompanyUpdate => {
                match self.planner.plan_company_update(template_name, &record)? {
                    CompanyUpdate::Updated { writes } => Ok(IntakeOutcome::CompanyUpdated {
                        writes,
                        reply: company_reply(&record),
                    }),
                    CompanyUpdate::NothingToUpdate => Ok(IntakeOutcome::NothingToUpdate {
                        reply: "更新するデータがありません".to_owned(),
                    }),
                }
            }
        }
    }
}

fn product_reply(record: &FieldRecord) -> String {
    let mut reply = "見積書データを登録しました！\n\n".to_owned();
    reply.push_str(&format!(
        "商品名: {}\n",
        record.product_name.as_deref().unwrap_or("N/A")
    ));
    reply.push_str(&format!(
        "単価: {}円\n",
        record.unit_price.as_deref().unwrap_or("N/A")
    ));
    reply.push_str(&format!(
        "数量: {}\n",
        record.quantity.as_deref().unwrap_or("N/A")
    ));
    if let Some(cycle) = record.cycle.as_deref().filter(|v| !v.is_empty()) {
        reply.push_str(&format!("サイクル: {cycle}\n"));
    }
    if let Some(place) = record.install_place.as_deref().filter(|v| !v.is_empty()) {
        reply.push_str(&format!("設置場所: {place}\n"));
    }
    match record.total_price {
        Some(total) => reply.push_str(&format!("料金: {total}円")),
        None => reply.push_str("料金: N/A"),
    }
    reply
}

fn company_reply(record: &FieldRecord) -> String {
    let mut reply = "会社情報を更新しました！\n\n".to_owned();
    if let Some(company) = record.company_name.as_deref().filter(|v| !v.is_empty()) {
        reply.push_str(&format!("会社名: {company}\n"));
    }
    if let Some(date) = record.date.as_deref().filter(|v| !v.is_empty()) {
        reply.push_str(&format!("日付: {date}\n"));
    }
    reply
}

fn format_help() -> String {
    "データの形式が正しくありません。\n\n\
     【会社情報更新】\n\
     例: 会社名:ABC株式会社\n例: 日付:2024/01/15\n\n\
     【商品データ登録】\n\
     例: 商品名:マット\n単価:1000\n数量:3"
        .to_owned()
}
