//! Goal routing: free text → one of the five intents.
//!
//! Two tiers. The keyword tier matches unambiguous shop-floor vocabulary and
//! costs nothing; anything it cannot settle goes to the model tier, which
//! answers with a token from the same closed set or declares the goal
//! unroutable. Neither tier ever invents an intent outside the set.

use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ai_client::Claude;
use floorsight_common::{FloorsightError, Intent};

use crate::traits::IntentClassifier;

/// Vocabulary that routes without a model call. Phrases are matched on word
/// boundaries, case-insensitive; a goal routes on keywords only when exactly
/// one intent scores hits.
const KEYWORD_RULES: &[(Intent, &str)] = &[
    (
        Intent::LineStatus,
        r"(?i)\b(status|down|running|idle|blocked|all lines|which lines|floor overview|status board)\b",
    ),
    (
        Intent::CapacityWip,
        r"(?i)\b(capacity|wip|work in progress|staffing|staffed|bottleneck|throughput|keep(ing)? up|overloaded|piling up)\b",
    ),
    (
        Intent::WorkInstructions,
        r"(?i)\b(instructions?|work steps|setup steps|how (do|to) (i|we)? ?(run|set ?up|operate)|operator guide|standard work)\b",
    ),
    (
        Intent::SupplierRisk,
        r"(?i)\b(suppliers?|vendor|lead[- ]?times?|reliability|shortage|late parts|material risk|stock ?out)\b",
    ),
    (
        Intent::Vsm,
        r"(?i)\b(value[- ]?stream|vsm|flow map|map (the|our) flow|process map|diagram)\b",
    ),
];

const ROUTER_SYSTEM_PROMPT: &str = r#"You route shop-floor questions to one of five fixed intents.

## Intents
- **line_status** — current state of the production lines: what is running, down, idle or blocked, and job progress across the floor.
- **capacity_wip** — staffing, skill coverage, WIP buildup and bottlenecks for one line and its current job.
- **work_instructions** — step-by-step operator instructions for the job running on a line.
- **supplier_risk** — supplier lead times, reliability and material exposure for a job's parts.
- **vsm** — a value-stream map of a line's operation flow.

## Rules
- Pick the single best-fitting intent for the goal.
- Answer "unroutable" when the goal is about none of these (weather, HR, pricing, chit-chat, other systems). Do not stretch an intent to cover it.
- Never invent an intent token outside the list above."#;

/// What the model tier returns.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct RoutedGoal {
    /// One of: "line_status", "capacity_wip", "work_instructions",
    /// "supplier_risk", "vsm" — or "unroutable" if the goal fits none
    intent: String,
    /// One sentence explaining the routing decision
    reason: String,
}

pub struct Router {
    rules: Vec<(Intent, Regex)>,
    claude: Claude,
}

impl Router {
    pub fn new(claude: Claude) -> Self {
        let rules = KEYWORD_RULES
            .iter()
            .map(|(intent, pattern)| (*intent, Regex::new(pattern).expect("valid keyword pattern")))
            .collect();
        Self { rules, claude }
    }

    /// Keyword tier. Routes only when exactly one intent scores hits; ties
    /// and zero-hit goals fall through to the model tier.
    fn keyword_intent(&self, goal: &str) -> Option<Intent> {
        let mut scored: Vec<(Intent, usize)> = self
            .rules
            .iter()
            .map(|(intent, re)| (*intent, re.find_iter(goal).count()))
            .filter(|(_, hits)| *hits > 0)
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        match scored.as_slice() {
            [(intent, _)] => Some(*intent),
            [(best, best_hits), (_, next_hits), ..] if best_hits > next_hits => Some(*best),
            _ => None,
        }
    }

    async fn model_intent(&self, goal: &str) -> Result<Intent, FloorsightError> {
        let routed: RoutedGoal = self
            .claude
            .extract(ROUTER_SYSTEM_PROMPT, format!("Goal: {goal}"))
            .await?;

        debug!(intent = %routed.intent, reason = %routed.reason, "Model tier routed goal");

        if routed.intent == "unroutable" {
            return Err(FloorsightError::UnroutableGoal {
                goal: goal.to_string(),
            });
        }
        // Anything else must parse as a real intent token; a stray token is
        // an UnknownIntent at this string boundary.
        routed.intent.parse()
    }
}

#[async_trait]
impl IntentClassifier for Router {
    async fn classify(&self, goal: &str) -> Result<Intent, FloorsightError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(FloorsightError::UnroutableGoal {
                goal: String::new(),
            });
        }

        if let Some(intent) = self.keyword_intent(goal) {
            debug!(%intent, "Keyword tier routed goal");
            return Ok(intent);
        }

        self.model_intent(goal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        // The model tier is never reached in these tests.
        Router::new(Claude::new("test-key", "test-model"))
    }

    #[test]
    fn keyword_tier_routes_clear_goals() {
        let router = router();
        let cases = [
            ("which lines are down right now", Intent::LineStatus),
            ("is L1 keeping up with its wip", Intent::CapacityWip),
            ("work instructions for the chassis job", Intent::WorkInstructions),
            ("show supplier lead-time exposure", Intent::SupplierRisk),
            ("draw the value-stream map for line two", Intent::Vsm),
        ];
        for (goal, want) in cases {
            assert_eq!(router.keyword_intent(goal), Some(want), "goal: {goal}");
        }
    }

    #[test]
    fn keyword_tier_is_case_insensitive() {
        let router = router();
        assert_eq!(
            router.keyword_intent("WHICH LINES ARE DOWN?"),
            Some(Intent::LineStatus)
        );
    }

    #[test]
    fn ambiguous_goals_fall_through_to_the_model() {
        let router = router();
        // One hit each for line_status ("status") and supplier_risk ("supplier").
        assert_eq!(router.keyword_intent("supplier status"), None);
        assert_eq!(router.keyword_intent("tell me about the plant"), None);
    }

    #[test]
    fn higher_scoring_intent_wins_a_mixed_goal() {
        let router = router();
        // supplier_risk scores twice ("supplier", "lead time"), line_status once.
        assert_eq!(
            router.keyword_intent("supplier lead time status"),
            Some(Intent::SupplierRisk)
        );
    }

    #[tokio::test]
    async fn empty_goal_is_unroutable_without_a_model_call() {
        let err = router().classify("   ").await.unwrap_err();
        assert!(matches!(err, FloorsightError::UnroutableGoal { .. }));
    }

    #[tokio::test]
    async fn keyword_routing_is_deterministic() {
        let router = router();
        let a = router.classify("which lines are down").await.unwrap();
        let b = router.classify("which lines are down").await.unwrap();
        assert_eq!(a, b);
    }
}
