//! Integration tests for action execution.

mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{
    guild, member, message_subject, role, user_subject, warden, Call, RecordingHost, CHANNEL_ID,
    GUILD_ID, USER_ID,
};
use warden_core::host::ExpelAction;
use warden_core::types::{Action, Rank};
use warden_core::{
    ErrorCode, HeatKey, HeatSubject, Mode, Rule, SandboxedHost, Subject, Warden, WardenConfig,
};

fn message_rule(actions: &str) -> Rule {
    Rule::parse(&format!(
        "name: test\nrank: 1\nevent: on-message\nif:\n  - message-contains-url: false\ndo:\n{actions}"
    ))
    .unwrap()
}

fn user_rule(actions: &str) -> Rule {
    Rule::parse(&format!(
        "name: test\nrank: 1\nevent: on-user-join\nif:\n  - is-staff: false\ndo:\n{actions}"
    ))
    .unwrap()
}

fn monitor(text: &str) -> Call {
    Call::Monitor(format!("[Warden] (test): {text}"))
}

#[tokio::test]
async fn test_heat_round_trip() {
    let (warden, _) = warden(RecordingHost::new());
    let bump = message_rule("  - add-custom-heatpoint: [x, 10m]\n");
    let check = Rule::parse(
        "name: check\nrank: 1\nevent: on-message\nif:\n  - custom-heat-more-than: [x, 0]\ndo:\n  - no-op:\n",
    )
    .unwrap();
    let reset = message_rule("  - empty-custom-heat: x\n");
    let subject = message_subject("hello");

    assert!(!warden.satisfies_conditions(&check, &subject, Mode::Production).await.unwrap());
    warden.do_actions(&bump, &subject, Mode::Production).await.unwrap();
    assert!(warden.satisfies_conditions(&check, &subject, Mode::Production).await.unwrap());

    // The other namespace never sees it.
    assert!(!warden.satisfies_conditions(&check, &subject, Mode::Sandbox).await.unwrap());

    warden.do_actions(&reset, &subject, Mode::Production).await.unwrap();
    assert!(!warden.satisfies_conditions(&check, &subject, Mode::Production).await.unwrap());
}

#[tokio::test]
async fn test_sandbox_heat_is_isolated() {
    let (warden, _) = warden(RecordingHost::new());
    let rule = message_rule("  - add-user-heatpoints: [3, 1h]\n  - add-channel-heatpoint: 1h\n");
    let subject = message_subject("hello");

    warden.do_actions(&rule, &subject, Mode::Sandbox).await.unwrap();

    let user = HeatSubject::User(USER_ID);
    let channel = HeatSubject::Channel(CHANNEL_ID);
    assert_eq!(warden.get_heat_points(Mode::Sandbox, GUILD_ID, user, "heat"), 3);
    assert_eq!(warden.get_heat_points(Mode::Sandbox, GUILD_ID, channel, "heat"), 1);
    assert_eq!(warden.get_heat_points(Mode::Production, GUILD_ID, user, "heat"), 0);
    assert_eq!(warden.get_heat_points(Mode::Production, GUILD_ID, channel, "heat"), 0);
}

#[tokio::test]
async fn test_heat_writes_are_visible_within_invocation() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = message_rule(
        "  - add-user-heatpoint: 10m\n  - add-user-heatpoint: 10m\n  - user-heat-more-than: 1\n  - if-true:\n      - send-to-monitor: \"heat is $user_heat\"\n",
    );

    warden
        .do_actions(&rule, &message_subject("hi"), Mode::Production)
        .await
        .unwrap();
    assert_eq!(host.calls(), vec![monitor("heat is 2")]);
}

#[tokio::test]
async fn test_scratchpad_does_not_persist() {
    let (warden, host) = warden(RecordingHost::new());
    let first = user_rule(
        "  - compare: [1, \"==\", 1]\n  - if-true:\n      - var-assign: [flag, set]\n      - add-user-heatpoint: 1h\n  - send-to-monitor: \"flag=$flag\"\n",
    );
    let second = user_rule(
        "  - compare: [\"$flag\", \"==\", set]\n  - if-true:\n      - send-to-monitor: seen\n  - if-false:\n      - send-to-monitor: \"unseen, heat=$user_heat\"\n",
    );
    let subject = user_subject();

    warden.do_actions(&first, &subject, Mode::Production).await.unwrap();
    warden.do_actions(&second, &subject, Mode::Production).await.unwrap();

    assert_eq!(
        host.calls(),
        vec![monitor("flag=set"), monitor("unseen, heat=1")]
    );
}

#[tokio::test]
async fn test_conditional_blocks_follow_last_result() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = user_rule(
        r#"  - if-true:
      - send-to-monitor: "nothing evaluated yet"
  - is-staff: true
  - if-true:
      - send-to-monitor: staff
  - if-false:
      - send-to-monitor: member
      - if-any:
          - compare: [1, "==", 2]
          - compare: [3, "==", 3]
      - if-true:
          - send-to-monitor: nested
  - if-false:
      - send-to-monitor: "last result is from the nested block"
"#,
    );

    let report = warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    assert_eq!(host.calls(), vec![monitor("member"), monitor("nested")]);
    assert_eq!(report.executed, 2);
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_exit_stops_the_list() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = user_rule("  - send-to-monitor: one\n  - exit:\n  - send-to-monitor: two\n");

    let report = warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    assert!(report.exited);
    assert_eq!(report.executed, 2);
    assert_eq!(host.calls(), vec![monitor("one")]);
}

#[tokio::test]
async fn test_effect_failure_does_not_halt() {
    let (warden, host) = warden(RecordingHost::new().failing("delete_message"));
    let rule = message_rule("  - delete-user-message:\n  - send-to-monitor: after\n");

    let report = warden
        .do_actions(&rule, &message_subject("hi"), Mode::Production)
        .await
        .unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].action, Action::DeleteUserMessage);
    assert_eq!(report.failures[0].error.code(), Some(ErrorCode::EffectFailed));
    assert_eq!(host.calls(), vec![monitor("after")]);
}

#[tokio::test]
async fn test_evaluation_errors_abort() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = user_rule(
        "  - send-to-monitor: before\n  - var-transform: [missing, uppercase]\n  - send-to-monitor: after\n",
    );

    let err = warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::EvalUnknownVariable));
    assert!(err.to_string().contains("Variable \"missing\" does not exist."));
    assert_eq!(host.calls(), vec![monitor("before")]);
}

#[tokio::test]
async fn test_ban_then_modlog() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = user_rule("  - ban-user-and-delete: 1\n  - send-mod-log: \"Spam from $user\"\n");

    let report = warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    assert!(report.expelled());
    assert_eq!(report.last_expel, Some(ExpelAction::Ban));
    assert_eq!(
        host.calls(),
        vec![
            Call::Ban {
                user: USER_ID,
                days: 1,
                reason: "Banned by Warden rule 'test'".to_string(),
            },
            Call::Modlog(USER_ID, ExpelAction::Ban, "Spam from Twentysix".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_modlog_needs_an_expel_and_member_must_be_present() {
    let mut host = RecordingHost::new();
    host.members.clear();
    let (warden, host) = warden(host);
    let rule = user_rule("  - kick-user:\n  - send-mod-log: reason\n");

    let report = warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    assert!(!report.expelled());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].error.code(), Some(ErrorCode::EffectNotFound));
    assert!(report.failures[0]
        .error
        .to_string()
        .contains("User Twentysix (262626) not in the server."));
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_sandboxed_host_swallows_effects() {
    let host = Arc::new(SandboxedHost::new(RecordingHost::new()));
    let warden = Warden::new(WardenConfig::default(), host.clone()).unwrap();
    let rule = message_rule(
        "  - delete-user-message:\n  - kick-user:\n  - add-user-heatpoint: 1h\n  - send-to-monitor: done\n",
    );
    let subject = message_subject("hi");

    let report = warden.do_actions(&rule, &subject, Mode::Sandbox).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report.last_expel, Some(ExpelAction::Kick));
    assert!(host.inner().calls().is_empty());
    assert_eq!(
        warden.get_heat_points(Mode::Sandbox, GUILD_ID, HeatSubject::User(USER_ID), "heat"),
        1
    );

    warden.do_actions(&rule, &subject, Mode::Production).await.unwrap();
    assert_eq!(host.inner().calls().len(), 3);
}

#[tokio::test]
async fn test_send_message_destinations() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = message_rule(
        r#"  - send-message:
      id: general
      content: "Hello $user_mention"
  - send-message:
      id: $user_id
      title: Warning
      description: "Watch it in $channel"
      color: false
  - send-message: {id: "1234", content: lost}
"#,
    );

    let report = warden
        .do_actions(&rule, &message_subject("hi"), Mode::Production)
        .await
        .unwrap();
    assert!(report.is_clean());

    let calls = host.calls();
    assert_eq!(calls.len(), 3);
    match &calls[0] {
        Call::Send { to, message } => {
            assert_eq!(to, "#general");
            assert_eq!(message.content.as_deref(), Some("Hello <@262626>"));
            assert!(!message.allow_mass_mentions);
        }
        other => panic!("unexpected {other:?}"),
    }
    match &calls[1] {
        Call::Send { to, message } => {
            assert_eq!(to, &format!("@{USER_ID}"));
            let embed = message.embed.as_ref().unwrap();
            assert_eq!(embed.title.as_deref(), Some("Warning"));
            assert_eq!(embed.description.as_deref(), Some("Watch it in #general"));
            assert_eq!(embed.color, warden_core::host::EmbedColor::None);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        calls[2],
        monitor("Failed to send message, I could not find the recipient.")
    );
}

#[tokio::test]
async fn test_send_message_edit_and_bad_channel() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = message_rule(
        "  - send-message: {id: mod-log, content: updated, edit_message_id: \"31337\"}\n  - send-message: {id: nowhere, content: hi}\n  - send-message: {id: general, edit_message_id: abc, content: x}\n",
    );

    let report = warden
        .do_actions(&rule, &message_subject("hi"), Mode::Production)
        .await
        .unwrap();
    assert_eq!(
        host.calls(),
        vec![Call::Edit {
            to: "#mod-log".to_string(),
            message_id: 31337
        }]
    );
    assert_eq!(report.failures.len(), 2);
    assert!(report.failures[0]
        .error
        .to_string()
        .contains("'nowhere' is not a valid channel name"));
    assert!(report.failures[1].error.to_string().contains("abc is not a valid ID"));
}

#[tokio::test]
async fn test_failed_dm_is_reported_to_monitor() {
    let (warden, host) = warden(RecordingHost::new().failing("dm"));
    let rule = user_rule("  - dm-user: hello\n  - delete-last-message-sent-after: 5m\n");

    let report = warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(
        host.calls(),
        vec![
            monitor("Action 'dm-user' is deprecated, use 'send-message' instead."),
            monitor("Failed to DM user Twentysix (262626)"),
        ]
    );
}

#[tokio::test]
async fn test_delete_last_message_sent() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = user_rule("  - notify-staff: \"$user joined\"\n  - delete-last-message-sent-after: 5m\n");

    warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    let calls = host.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], Call::Notify(n) if n.text == "Twentysix joined" && !n.ping));
    assert_eq!(calls[1], Call::DeleteAfter(9001, Duration::minutes(5)));
}

#[tokio::test]
async fn test_role_changes_are_deduplicated() {
    let (warden, host) = warden(RecordingHost::new());
    let mut user = member(USER_ID, "Twentysix");
    user.roles = vec![role(2, "verified")];
    let subject = Subject::user(guild(), user, Rank::Rank3);
    let rule = user_rule(
        "  - add-roles-to-user: [muted, 1, verified, 999]\n  - remove-roles-from-user: [verified, muted]\n",
    );

    warden.do_actions(&rule, &subject, Mode::Production).await.unwrap();
    assert_eq!(
        host.calls(),
        vec![
            Call::AddRoles(USER_ID, vec![1]),
            Call::RemoveRoles(USER_ID, vec![2]),
        ]
    );
}

#[tokio::test]
async fn test_punish_without_role() {
    let mut host = RecordingHost::new();
    host.no_punish_role = true;
    let (warden, host) = warden(host);
    let rule = user_rule("  - punish-user:\n");

    warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    assert_eq!(
        host.calls(),
        vec![monitor(
            "Failed to punish user. Is the punish role still present and with *no* privileges?"
        )]
    );
}

#[tokio::test]
async fn test_variable_actions() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = user_rule(
        r#"  - var-assign: [greeting, "hello, $user", true]
  - var-assign: [raw, "$user"]
  - var-transform: [greeting, title]
  - var-replace: [greeting, [",", "!"], ""]
  - var-split: [greeting, " ", [first, rest], 1]
  - var-slice: [first, 0, 3, short]
  - var-transform: [short, reverse]
  - var-assign-random: [pick, [only]]
  - var-assign-random: [weighted, {yes: 1, no: 0}]
  - send-to-monitor: "$greeting|$raw|$first|$rest|$short|$pick|$weighted"
"#,
    );

    let report = warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(
        host.calls(),
        vec![monitor("Hello Twentysix|$user|Hello|Twentysix|leH|only|yes")]
    );
}

#[tokio::test]
async fn test_var_slice_with_huge_step() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = user_rule(
        r#"  - var-assign: [word, hello]
  - var-slice: {var_name: word, index: 1, end_index: 5, slice_into: fwd, step: 9223372036854775807}
  - var-slice: {var_name: word, index: -1, slice_into: back, step: -9223372036854775808}
  - send-to-monitor: "$fwd|$back"
"#,
    );

    let report = warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(host.calls(), vec![monitor("e|o")]);
}

#[tokio::test]
async fn test_get_user_info() {
    let mut host = RecordingHost::new();
    host.staff.insert(USER_ID);
    host.message_counts.insert(USER_ID, 12);
    let (warden, host) = warden(host);
    let rule = user_rule(&format!(
        "  - get-user-info: [\"{USER_ID}\", {{who: display_name, count: message_count, staff: is_staff, level: rank}}]\n  - send-to-monitor: \"$who $count $staff $level\"\n"
    ));

    warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    assert_eq!(host.calls(), vec![monitor("Twentysix 12 true 1")]);

    let rule = user_rule("  - get-user-info: [\"$user_id\", {x: _secret}]\n");
    let err = warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap_err();
    assert!(err.is_evaluation());
    assert!(err.to_string().contains("internal attributes"));
}

#[tokio::test]
async fn test_empty_user_heat_resets_variable() {
    let (warden, host) = warden(RecordingHost::new());
    let key = HeatKey::user(Mode::Production, GUILD_ID, USER_ID);
    warden.heat().increase_by(&key, 4, None);
    let rule = user_rule(
        "  - send-to-monitor: \"before $user_heat\"\n  - empty-user-heat:\n  - send-to-monitor: \"after $user_heat\"\n",
    );

    warden
        .do_actions(&rule, &user_subject(), Mode::Production)
        .await
        .unwrap();
    assert_eq!(host.calls(), vec![monitor("before 4"), monitor("after 0")]);
    assert_eq!(warden.heat().get(&key), 0);
}

#[tokio::test]
async fn test_message_effects() {
    let (warden, host) = warden(RecordingHost::new());
    let rule = message_rule(
        "  - set-channel-slowmode: 30s\n  - punish-user-with-message:\n  - enable-emergency-mode: true\n  - set-user-nickname: \"\"\n  - issue-command: [262626, \"warn $user_id spam\"]\n",
    );

    let report = warden
        .do_actions(&rule, &message_subject("hi"), Mode::Production)
        .await
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(
        host.calls(),
        vec![
            Call::Slowmode(CHANNEL_ID, Duration::seconds(30)),
            Call::Punish {
                user: USER_ID,
                channel: Some(CHANNEL_ID)
            },
            Call::Emergency(true),
            Call::Nickname(USER_ID, None),
            Call::Command {
                issuer: USER_ID,
                command: "warn 262626 spam".to_string()
            },
        ]
    );
}
