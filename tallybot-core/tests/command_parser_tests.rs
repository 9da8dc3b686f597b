// File: tallybot-core/tests/command_parser_tests.rs

use tallybot_common::models::command::{
    ChannelCommandConfig, ChatCommandDefinition, CommandAction, CustomCounterDefinition,
    PermissionLevel,
};
use tallybot_common::models::counter::CounterId;
use tallybot_core::services::command_parser::{
    normalize_base_command_or_default, normalize_base_command_or_empty, CommandResolver,
};

fn test_config() -> ChannelCommandConfig {
    let mut pulls = CustomCounterDefinition::new("pulls", "Pulls");
    pulls.alias_command = Some("!pulls".to_string());
    pulls.long_command = Some("!pullcount".to_string());
    pulls.increment_by = 2;

    ChannelCommandConfig {
        channel_id: "chan1".to_string(),
        commands: vec![
            ChatCommandDefinition {
                command: "!sorry".to_string(),
                action: CommandAction::CustomResponse,
                counter_ids: vec![],
                required_permission: PermissionLevel::Everyone,
                cooldown_seconds: 0,
                is_enabled: true,
                response: Some("It happens!".to_string()),
            },
            ChatCommandDefinition {
                command: "!newgame".to_string(),
                action: CommandAction::Reset,
                counter_ids: vec!["deaths".to_string(), "swears".to_string()],
                required_permission: PermissionLevel::Broadcaster,
                cooldown_seconds: 0,
                is_enabled: true,
                response: None,
            },
        ],
        custom_counters: vec![pulls],
        max_increment_amount: 10,
    }
}

#[test]
fn normalization_is_case_whitespace_and_operator_insensitive() {
    assert_eq!(normalize_base_command_or_empty("  !Pulls+  "), "!pulls");
    assert_eq!(normalize_base_command_or_empty("pulls-"), "!pulls");
    assert_eq!(normalize_base_command_or_empty("PULLS"), "!pulls");
    assert_eq!(normalize_base_command_or_empty("!pulls++--"), "!pulls");
}

#[test]
fn normalization_is_idempotent() {
    let once = normalize_base_command_or_empty("  !Pulls+  ");
    assert_eq!(normalize_base_command_or_empty(&once), once);
}

#[test]
fn normalization_of_blank_input_is_empty() {
    assert_eq!(normalize_base_command_or_empty(""), "");
    assert_eq!(normalize_base_command_or_empty("   "), "");
    assert_eq!(normalize_base_command_or_empty("!+-"), "");
}

#[test]
fn normalization_falls_back_to_default() {
    assert_eq!(normalize_base_command_or_default("", "Fallback+"), "!fallback");
    assert_eq!(normalize_base_command_or_default("!custom", "fallback"), "!custom");
}

#[test]
fn input_without_bang_is_not_a_command() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);
    assert!(resolver.resolve(&config, "hello chat").is_none());
    assert!(resolver.resolve(&config, "deaths+").is_none());
    assert!(resolver.resolve(&config, "").is_none());
}

#[test]
fn builtin_mutation_resolves_under_moderator_permission() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);

    let resolved = resolver.resolve(&config, "!death+").expect("should resolve");
    assert_eq!(resolved.action, CommandAction::Increment);
    assert_eq!(resolved.targets.len(), 1);
    assert_eq!(resolved.targets[0].counter, CounterId::Deaths);
    assert_eq!(resolved.targets[0].amount, 1);
    assert_eq!(resolved.required_permission, PermissionLevel::Moderator);
    assert_eq!(resolved.cooldown_key, "!deaths");
}

#[test]
fn builtin_query_verbs_resolve_for_everyone() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);

    let resolved = resolver.resolve(&config, "!deaths").expect("should resolve");
    assert_eq!(resolved.action, CommandAction::Query);
    assert_eq!(resolved.required_permission, PermissionLevel::Everyone);

    let stats = resolver.resolve(&config, "!stats").expect("should resolve");
    assert_eq!(stats.action, CommandAction::Query);
    assert_eq!(stats.targets.len(), 3);
}

#[test]
fn inline_amount_is_multiplied_and_clamped() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);

    // 3 x IncrementBy(2) = 6, under the ceiling.
    let resolved = resolver.resolve(&config, "!pulls3+").expect("should resolve");
    assert_eq!(resolved.action, CommandAction::Increment);
    assert_eq!(resolved.targets[0].counter, CounterId::Custom("pulls".to_string()));
    assert_eq!(resolved.targets[0].amount, 6);

    // 9 x 2 = 18, clamped to the channel max of 10.
    let clamped = resolver.resolve(&config, "!pulls9+").expect("should resolve");
    assert_eq!(clamped.targets[0].amount, 10);

    // No inline digits defaults to 1 x multiplier.
    let plain = resolver.resolve(&config, "!pulls+").expect("should resolve");
    assert_eq!(plain.targets[0].amount, 2);

    // Decrement uses its own multiplier (1 here).
    let dec = resolver.resolve(&config, "!pulls-").expect("should resolve");
    assert_eq!(dec.action, CommandAction::Decrement);
    assert_eq!(dec.targets[0].amount, 1);
}

#[test]
fn absurdly_long_digit_runs_stay_bounded() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);
    let resolved = resolver
        .resolve(&config, "!pulls99999999999999999999999+")
        .expect("should resolve");
    assert_eq!(resolved.targets[0].amount, 10);
}

#[test]
fn alias_and_long_command_share_a_cooldown_key() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);

    let via_alias = resolver.resolve(&config, "!pulls+").expect("should resolve");
    let via_long = resolver.resolve(&config, "!PullCount+").expect("should resolve");
    assert_eq!(via_alias.cooldown_key, via_long.cooldown_key);
    assert_eq!(via_alias.targets[0].counter, via_long.targets[0].counter);
}

#[test]
fn deprecated_amount_syntaxes_do_not_match() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);

    assert!(resolver.resolve(&config, "!pulls+:5").is_none());
    assert!(resolver.resolve(&config, "!pulls+ 5").is_none());
    assert!(resolver.resolve(&config, "!pulls+\u{00A0}5").is_none());
}

#[test]
fn double_operator_does_not_match() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);
    assert!(resolver.resolve(&config, "!pulls++").is_none());
    assert!(resolver.resolve(&config, "!pulls+-").is_none());
}

#[test]
fn oversized_counter_id_is_unresolved() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);
    let message = format!("!{}+", "a".repeat(70));
    assert!(resolver.resolve(&config, &message).is_none());
}

#[test]
fn resolution_ignores_case_and_surrounding_whitespace() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);

    let resolved = resolver.resolve(&config, "  !Death+  ").expect("should resolve");
    assert_eq!(resolved.targets[0].counter, CounterId::Deaths);

    let custom = resolver.resolve(&config, "!PULLS3+").expect("should resolve");
    assert_eq!(custom.targets[0].amount, 6);
}

#[test]
fn table_commands_resolve_by_exact_literal_match() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);

    let sorry = resolver.resolve(&config, "!Sorry").expect("should resolve");
    assert_eq!(sorry.action, CommandAction::CustomResponse);
    assert_eq!(sorry.response.as_deref(), Some("It happens!"));

    let newgame = resolver.resolve(&config, "!newgame").expect("should resolve");
    assert_eq!(newgame.action, CommandAction::Reset);
    assert_eq!(newgame.targets.len(), 2);
    assert_eq!(newgame.required_permission, PermissionLevel::Broadcaster);

    // Extra text breaks the exact match.
    assert!(resolver.resolve(&config, "!newgame now").is_none());
}

#[test]
fn custom_counter_query_form_resolves_without_operator() {
    let config = test_config();
    let resolver = CommandResolver::compile(&config);

    let resolved = resolver.resolve(&config, "!pullcount").expect("should resolve");
    assert_eq!(resolved.action, CommandAction::Query);
    assert_eq!(resolved.targets[0].counter, CounterId::Custom("pulls".to_string()));
}
