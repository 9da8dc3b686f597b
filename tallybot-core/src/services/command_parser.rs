// File: tallybot-core/src/services/command_parser.rs
//! Turns raw chat text into a resolved command.
//!
//! A channel's command table and custom counters are compiled once into
//! lookup tables; per-message work is two map probes, never string
//! re-interpretation of config.

use std::collections::HashMap;

use tracing::warn;

use tallybot_common::models::command::{
    ChannelCommandConfig, ChatCommandDefinition, CommandAction, PermissionLevel,
};
use tallybot_common::models::counter::CounterId;

/// Longest counter id the resolver will consider. Anything longer is
/// unresolved, never an error.
pub const MAX_COUNTER_ID_LEN: usize = 64;

/// Ceiling used when a channel has no explicit max-increment configured.
const DEFAULT_MAX_INCREMENT_AMOUNT: i64 = 100;

/// Canonicalizes configured command text: trims, lowercases, ensures a
/// single leading `!`, and strips one or more trailing `+`/`-`.
/// Returns `""` for blank input.
pub fn normalize_base_command_or_empty(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lowered = trimmed.to_lowercase();
    let stem = lowered
        .trim_start_matches('!')
        .trim_end_matches(['+', '-']);
    if stem.is_empty() {
        return String::new();
    }
    format!("!{stem}")
}

/// Same normalization; falls back to normalizing `fallback` when `input`
/// normalizes to empty.
pub fn normalize_base_command_or_default(input: &str, fallback: &str) -> String {
    let normalized = normalize_base_command_or_empty(input);
    if normalized.is_empty() {
        normalize_base_command_or_empty(fallback)
    } else {
        normalized
    }
}

/// One target of a resolved command with its per-counter amount
/// (inline digits x the counter's multiplier, clamped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterTarget {
    pub counter: CounterId,
    pub amount: i64,
}

/// The parse result the pipeline acts on.
#[derive(Debug, Clone)]
pub struct ResolvedCommand {
    pub action: CommandAction,
    pub targets: Vec<CounterTarget>,

    /// Canonical identity for cooldown bucketing. Alias and long-command
    /// surface forms of one counter share this key.
    pub cooldown_key: String,

    pub required_permission: PermissionLevel,
    pub cooldown_seconds: i64,
    pub is_enabled: bool,
    pub response: Option<String>,
}

#[derive(Debug, Clone)]
struct MutationStem {
    counter: CounterId,
    increment_by: i64,
    decrement_by: i64,
    required_permission: PermissionLevel,
    cooldown_seconds: i64,
    is_enabled: bool,
}

/// Per-channel resolver compiled from `ChannelCommandConfig`.
pub struct CommandResolver {
    /// Whole-message literal matches: query verbs, reset commands,
    /// custom responses, multi-counter actions.
    exact: HashMap<String, ChatCommandDefinition>,

    /// Mutation grammar stems: `!death`, a custom counter's alias, or its
    /// long command, all pointing at the same counter.
    stems: HashMap<String, MutationStem>,

    max_increment_amount: i64,
}

impl CommandResolver {
    pub fn compile(config: &ChannelCommandConfig) -> Self {
        let max_increment_amount = if config.max_increment_amount > 0 {
            config.max_increment_amount
        } else {
            DEFAULT_MAX_INCREMENT_AMOUNT
        };

        // Streamer-authored table entries first; only these may override
        // the gate data of built-in or custom-counter stems.
        let mut table: HashMap<String, ChatCommandDefinition> = HashMap::new();
        for def in &config.commands {
            let key = normalize_base_command_or_empty(&def.command);
            if key.is_empty() {
                warn!("channel {}: skipping command with blank token", config.channel_id);
                continue;
            }
            if def.counter_ids.iter().any(|id| id.len() > MAX_COUNTER_ID_LEN) {
                warn!(
                    "channel {}: skipping command '{}' with oversized counter id",
                    config.channel_id, def.command
                );
                continue;
            }
            table.insert(key, def.clone());
        }

        let mut exact = table.clone();

        // Built-in query verbs, unless the channel's table claims them.
        for (token, counters) in [
            ("!deaths", vec!["deaths"]),
            ("!swears", vec!["swears"]),
            ("!screams", vec!["screams"]),
            ("!stats", vec!["deaths", "swears", "screams"]),
        ] {
            exact.entry(token.to_string()).or_insert_with(|| ChatCommandDefinition {
                command: token.to_string(),
                action: CommandAction::Query,
                counter_ids: counters.iter().map(|s| s.to_string()).collect(),
                required_permission: PermissionLevel::Everyone,
                cooldown_seconds: 0,
                is_enabled: true,
                response: None,
            });
        }

        let mut stems: HashMap<String, MutationStem> = HashMap::new();

        // Built-in counters mutate under moderator permission; a table
        // entry for any surface form overrides the gate data, and the
        // same stem backs every form so they share one cooldown bucket.
        for (counter, tokens) in [
            (CounterId::Deaths, ["!deaths", "!death"]),
            (CounterId::Swears, ["!swears", "!swear"]),
            (CounterId::Screams, ["!screams", "!scream"]),
        ] {
            let stem = Self::stem_with_overrides(&table, &tokens, counter, 1, 1);
            for token in tokens {
                stems.insert(token.to_string(), stem.clone());
            }
        }

        for def in &config.custom_counters {
            if def.counter_id.is_empty() || def.counter_id.len() > MAX_COUNTER_ID_LEN {
                warn!(
                    "channel {}: skipping custom counter with invalid id '{}'",
                    config.channel_id, def.counter_id
                );
                continue;
            }
            let counter = CounterId::parse(&def.counter_id);
            let increment_by = def.increment_by.max(1);
            let decrement_by = def.decrement_by.max(1);

            let surfaces: Vec<String> = [def.alias_command.as_deref(), def.long_command.as_deref()]
                .into_iter()
                .flatten()
                .map(normalize_base_command_or_empty)
                .filter(|key| !key.is_empty())
                .collect();
            let surface_refs: Vec<&str> = surfaces.iter().map(String::as_str).collect();
            let stem = Self::stem_with_overrides(
                &table,
                &surface_refs,
                counter,
                increment_by,
                decrement_by,
            );

            for key in &surfaces {
                // Query form (no operator), unless the table claims the
                // token.
                exact.entry(key.clone()).or_insert_with(|| ChatCommandDefinition {
                    command: key.clone(),
                    action: CommandAction::Query,
                    counter_ids: vec![def.counter_id.clone()],
                    required_permission: PermissionLevel::Everyone,
                    cooldown_seconds: 0,
                    is_enabled: true,
                    response: None,
                });
                stems.insert(key.clone(), stem.clone());
            }
        }

        Self { exact, stems, max_increment_amount }
    }

    fn stem_with_overrides(
        table: &HashMap<String, ChatCommandDefinition>,
        surface_keys: &[&str],
        counter: CounterId,
        increment_by: i64,
        decrement_by: i64,
    ) -> MutationStem {
        let override_def = surface_keys.iter().find_map(|key| table.get(*key));
        MutationStem {
            counter,
            increment_by,
            decrement_by,
            required_permission: override_def
                .map(|d| d.required_permission)
                .unwrap_or(PermissionLevel::Moderator),
            cooldown_seconds: override_def.map(|d| d.cooldown_seconds).unwrap_or(0),
            is_enabled: override_def.map(|d| d.is_enabled).unwrap_or(true),
        }
    }

    /// Resolves a raw chat message. `None` means "not a command" and the
    /// pipeline stays silent.
    pub fn resolve(&self, config: &ChannelCommandConfig, message: &str) -> Option<ResolvedCommand> {
        let trimmed = message.trim();
        if !trimmed.starts_with('!') {
            return None;
        }
        let lowered = trimmed.to_lowercase();

        if let Some(def) = self.exact.get(&lowered) {
            return Some(self.resolve_definition(config, def));
        }

        // Mutation grammar: `!` + stem + optional inline digits + exactly
        // one trailing operator, as a single token. The retired amount
        // syntaxes (`!x+:5`, `!x+ 5`, NBSP variants) contain whitespace or
        // break the digit/operator shape and fall through to no match.
        if lowered.chars().any(char::is_whitespace) {
            return None;
        }
        let op = lowered.chars().last()?;
        if op != '+' && op != '-' {
            return None;
        }
        let body = &lowered[..lowered.len() - 1];
        if body.ends_with(['+', '-']) {
            return None;
        }

        let digit_suffix = body
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_digit())
            .count();
        let (stem_part, digits) = body.split_at(body.len() - digit_suffix);

        if stem_part.len() > MAX_COUNTER_ID_LEN + 1 {
            return None;
        }

        if let Some(stem) = self.stems.get(stem_part) {
            return Some(self.resolve_mutation(stem, op, digits));
        }
        // Counter ids may themselves end in digits; retry with the whole
        // body as the stem and no inline amount.
        self.stems
            .get(body)
            .map(|stem| self.resolve_mutation(stem, op, ""))
    }

    fn resolve_mutation(&self, stem: &MutationStem, op: char, digits: &str) -> ResolvedCommand {
        let action = if op == '+' {
            CommandAction::Increment
        } else {
            CommandAction::Decrement
        };
        let multiplier = match action {
            CommandAction::Increment => stem.increment_by,
            _ => stem.decrement_by,
        };
        let base = if digits.is_empty() {
            1
        } else {
            // A digit run too long for i64 is still a mutation request;
            // the channel ceiling bounds it.
            digits.parse::<i64>().unwrap_or(self.max_increment_amount)
        };
        let amount = base
            .max(1)
            .saturating_mul(multiplier)
            .min(self.max_increment_amount);

        ResolvedCommand {
            action,
            targets: vec![CounterTarget { counter: stem.counter.clone(), amount }],
            cooldown_key: format!("!{}", stem.counter.as_str()),
            required_permission: stem.required_permission,
            cooldown_seconds: stem.cooldown_seconds,
            is_enabled: stem.is_enabled,
            response: None,
        }
    }

    fn resolve_definition(
        &self,
        config: &ChannelCommandConfig,
        def: &ChatCommandDefinition,
    ) -> ResolvedCommand {
        let targets: Vec<CounterTarget> = def
            .counter_ids
            .iter()
            .map(|id| {
                let counter = CounterId::parse(id);
                let amount = match def.action {
                    CommandAction::Increment | CommandAction::Decrement => {
                        let multiplier = config
                            .custom_definition(id)
                            .map(|c| match def.action {
                                CommandAction::Increment => c.increment_by.max(1),
                                _ => c.decrement_by.max(1),
                            })
                            .unwrap_or(1);
                        multiplier.min(self.max_increment_amount)
                    }
                    _ => 0,
                };
                CounterTarget { counter, amount }
            })
            .collect();

        // Single-counter commands bucket cooldowns by the canonical
        // counter id so every surface form shares one window; anything
        // else buckets by its own token.
        let cooldown_key = if targets.len() == 1 {
            format!("!{}", targets[0].counter.as_str())
        } else {
            normalize_base_command_or_default(&def.command, "!")
        };

        ResolvedCommand {
            action: def.action,
            targets,
            cooldown_key,
            required_permission: def.required_permission,
            cooldown_seconds: def.cooldown_seconds,
            is_enabled: def.is_enabled,
            response: def.response.clone(),
        }
    }
}
