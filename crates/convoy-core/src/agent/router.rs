//! Capability routing over a set of registered agents.
//!
//! Candidates are agents advertising the requested capability, in
//! registration order. The strategy decides the winner among them.

use convoy_types::error::AgentError;
use semver::Version;
use tracing::debug;

use super::box_agent::BoxAgent;

/// Tie-break rule applied when more than one agent advertises a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingStrategy {
    /// Highest `priority` wins; ties resolve as a `(priority, name)`
    /// tuple max, so the lexicographically largest name prevails.
    #[default]
    HighestPriority,
    /// Highest parsed version wins; ties resolve by name the same way.
    NewestVersion,
    /// Earliest-registered candidate wins.
    FirstRegistered,
    /// More than one candidate is an error.
    FailOnConflict,
}

/// Pick one agent for `capability` out of `agents` (registration order).
///
/// Returns [`AgentError::NoAgentForCapability`] when nothing matches and
/// [`AgentError::RoutingConflict`] under [`RoutingStrategy::FailOnConflict`]
/// when more than one agent matches.
pub fn route<'a>(
    agents: &[&'a BoxAgent],
    capability: &str,
    strategy: RoutingStrategy,
) -> Result<&'a BoxAgent, AgentError> {
    let candidates: Vec<&BoxAgent> = agents
        .iter()
        .copied()
        .filter(|a| a.metadata().has_capability(capability))
        .collect();

    if candidates.is_empty() {
        return Err(AgentError::NoAgentForCapability(capability.to_string()));
    }
    if candidates.len() == 1 {
        return Ok(candidates[0]);
    }

    let chosen = match strategy {
        RoutingStrategy::HighestPriority => candidates
            .iter()
            .copied()
            .max_by(|a, b| {
                a.metadata()
                    .priority
                    .cmp(&b.metadata().priority)
                    .then_with(|| a.name().cmp(b.name()))
            })
            .ok_or_else(|| AgentError::NoAgentForCapability(capability.to_string()))?,
        RoutingStrategy::NewestVersion => candidates
            .iter()
            .copied()
            .max_by(|a, b| {
                lenient_version(&a.metadata().version)
                    .cmp(&lenient_version(&b.metadata().version))
                    .then_with(|| a.name().cmp(b.name()))
            })
            .ok_or_else(|| AgentError::NoAgentForCapability(capability.to_string()))?,
        RoutingStrategy::FirstRegistered => candidates[0],
        RoutingStrategy::FailOnConflict => {
            let mut names: Vec<String> =
                candidates.iter().map(|a| a.name().to_string()).collect();
            names.sort();
            return Err(AgentError::RoutingConflict {
                capability: capability.to_string(),
                contenders: names,
            });
        }
    };

    debug!(
        capability = %capability,
        agent = %chosen.name(),
        strategy = ?strategy,
        candidates = candidates.len(),
        "routed capability"
    );
    Ok(chosen)
}

/// Parse a version string leniently: `semver` first, then a best-effort
/// dotted-numeric read where non-numeric components count as zero.
fn lenient_version(raw: &str) -> Version {
    if let Ok(v) = Version::parse(raw) {
        return v;
    }
    let mut parts = raw.split('.').map(|p| {
        p.chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse::<u64>()
            .unwrap_or(0)
    });
    Version::new(
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}
