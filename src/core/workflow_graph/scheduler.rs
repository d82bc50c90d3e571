#![allow(clippy::result_large_err)] // Scheduler returns AppError to preserve full diagnostic context of failing activities.

use crate::core::error::AppError;
use crate::core::workflow_graph::context::WorkflowContext;
use tracing::{debug, warn};

/// Traverse the graph depth-first from `start_activity` and return the activities it blocked on.
///
/// The work list is a LIFO stack of activity indices: when an activity produces several
/// outcomes, the destination pushed last is visited first. A single activity whose gate
/// reports false halts the whole traversal, discarding every pending entry but keeping the
/// blocking ids found so far. Event activities
/// only execute when they are the first activity popped; anywhere else they are recorded as
/// blocking. The returned ids are distinct, in the order they were first blocked on.
pub async fn execute_workflow(
    context: &mut WorkflowContext,
    start_activity: &str,
) -> Result<Vec<String>, AppError> {
    let instance_id = context.instance().id;
    let Some(start) = context.activity_index(start_activity) else {
        warn!(
            %instance_id,
            activity_id = start_activity,
            "start activity does not resolve to an activity; nothing to execute"
        );
        return Ok(Vec::new());
    };

    let mut stack = vec![start];
    let mut first_pass = true;
    let mut blocking: Vec<String> = Vec::new();

    while let Some(index) = stack.pop() {
        let is_first = std::mem::replace(&mut first_pass, false);
        let activity_id = context.activities()[index].record.id.clone();

        if !context.can_execute(index) {
            debug!(
                %instance_id,
                activity_id = %activity_id,
                pending = stack.len(),
                "activity gate closed; halting traversal"
            );
            break;
        }

        if !is_first && context.is_event(index) {
            debug!(%instance_id, activity_id = %activity_id, "blocking on event activity");
            blocking.push(activity_id);
            continue;
        }

        if context.broadcast_activity_executing(&activity_id) {
            warn!(%instance_id, activity_id = %activity_id, "activity execution cancelled");
            continue;
        }

        debug!(%instance_id, activity_id = %activity_id, "executing activity");
        let outcomes = context.execute_activity(index).await?;
        context.broadcast_activity_executed(&activity_id);

        for outcome in &outcomes {
            let Some(transition) = context.definition().transition_for(&activity_id, outcome)
            else {
                debug!(
                    %instance_id,
                    activity_id = %activity_id,
                    outcome = %outcome,
                    "no transition for outcome"
                );
                continue;
            };
            match context.activity_index(&transition.destination) {
                Some(next) => stack.push(next),
                None => warn!(
                    %instance_id,
                    activity_id = %activity_id,
                    outcome = %outcome,
                    destination = %transition.destination,
                    "transition destination does not resolve; skipping"
                ),
            }
        }
    }

    Ok(dedupe(blocking))
}

fn dedupe(ids: Vec<String>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !distinct.contains(&id) {
            distinct.push(id);
        }
    }
    distinct
}
