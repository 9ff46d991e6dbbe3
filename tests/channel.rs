mod common;

use common::{
    Script,
    ScriptedTransport,
    Step,
};
use scrawl::channel::{
    Args as ChannelArgs,
    Channel,
    OperationOptions,
};
use scrawl::errors::ScrawlError;
use std::sync::{
    Arc,
    Mutex,
};
use std::time::{
    Duration,
    Instant,
};

const OPS_TIMEOUT: Duration = Duration::from_secs(5);

fn scripted_channel(
    steps: Vec<Step>,
    telnet_flavor: bool,
    user: &str,
    password: &str,
) -> (Channel, Arc<Mutex<Script>>) {
    let (transport, script) = ScriptedTransport::with_auth(steps, telnet_flavor, user, password);

    let mut args = ChannelArgs::default();
    args.timeout_ops = OPS_TIMEOUT;

    (Channel::new(args, transport), script)
}

#[test]
fn ssh_auth_answers_password_prompt() {
    let (mut channel, script) = scripted_channel(
        vec![
            Step::new("", "\nPassword: "),
            Step::new("hunter2\n", "\nswitch01#"),
        ],
        false,
        "",
        "hunter2",
    );

    channel.open().unwrap();

    let prompt = channel.get_prompt().unwrap();

    assert_eq!(prompt, b"switch01#".to_vec());

    channel.close().unwrap();

    assert!(script.lock().unwrap().closed);
}

#[test]
fn telnet_auth_answers_username_and_password_prompts() {
    let (mut channel, _script) = scripted_channel(
        vec![
            Step::new("", "\nlogin: "),
            Step::new("admin\n", "\nPassword: "),
            Step::new("hunter2\n", "\nswitch01#"),
        ],
        true,
        "admin",
        "hunter2",
    );

    channel.open().unwrap();

    let prompt = channel.get_prompt().unwrap();

    assert_eq!(prompt, b"switch01#".to_vec());

    channel.close().unwrap();
}

#[test]
fn auth_failure_output_fails_open_and_closes_the_transport() {
    let (mut channel, script) = scripted_channel(
        vec![
            Step::new("", "\nPassword: "),
            Step::new("wrong\n", "\nPermission denied, please try again.\nPassword: "),
        ],
        false,
        "",
        "wrong",
    );

    let err = channel.open().unwrap_err();

    assert!(matches!(err, ScrawlError::AuthenticationFailed { .. }));
    assert!(script.lock().unwrap().closed);
}

#[test]
fn ansi_sequences_never_reach_the_prompt_matcher() {
    let (mut channel, _script) = scripted_channel(
        vec![Step::new("", "\x1b]0;box\x07\x1b[1;32muser@box$\x1b[0m")],
        false,
        "",
        "",
    );

    channel.open().unwrap();

    let prompt = channel.get_prompt().unwrap();

    assert_eq!(prompt, b"user@box$".to_vec());
    assert!(!prompt.contains(&0x1b));

    channel.close().unwrap();
}

#[test]
fn session_log_captures_io_but_never_credentials() {
    let log_path = std::env::temp_dir().join(format!(
        "scrawl-session-log-{}-{:?}.log",
        std::process::id(),
        std::thread::current().id()
    ));

    let (transport, _script) = ScriptedTransport::with_auth(
        vec![
            Step::new("", "\nPassword: "),
            Step::new("hunter2\n", "\nswitch01#"),
            Step::new("show version", "show version"),
            Step::new("\n", "\nIOS XE v17\nswitch01#"),
        ],
        false,
        "",
        "hunter2",
    );

    let mut args = ChannelArgs::default();
    args.timeout_ops = OPS_TIMEOUT;
    args.session_log_path = Some(log_path.clone());

    let mut channel = Channel::new(args, transport);

    channel.open().unwrap();

    let (_raw, processed) = channel
        .send_input("show version", &OperationOptions::default())
        .unwrap();

    assert_eq!(processed, b"IOS XE v17".to_vec());

    channel.close().unwrap();

    let log_contents = std::fs::read_to_string(&log_path).unwrap();
    std::fs::remove_file(&log_path).unwrap();

    assert!(log_contents.contains("Password:"));
    assert!(log_contents.contains("show version"));
    assert!(log_contents.contains("IOS XE v17"));
    assert!(!log_contents.contains("hunter2"));
}

#[test]
fn timed_out_operations_leave_the_channel_usable() {
    let (transport, script) =
        ScriptedTransport::with_auth(vec![Step::new("", "switch01#")], false, "", "");

    let mut args = ChannelArgs::default();
    args.timeout_ops = Duration::from_millis(200);

    let mut channel = Channel::new(args, transport);

    channel.open().unwrap();

    let started = Instant::now();
    let err = channel.read_until_explicit(b"never-coming").unwrap_err();

    assert!(matches!(err, ScrawlError::ChannelTimeout { .. }));
    assert!(started.elapsed() < Duration::from_millis(1_500));
    assert!(!script.lock().unwrap().closed);

    {
        let mut unlocked_script = script.lock().unwrap();
        unlocked_script.push_step(Step::new("ping", "ping"));
        unlocked_script.push_step(Step::new("\n", "\npong\nswitch01#"));
    }

    let (raw, processed) = channel
        .send_input("ping", &OperationOptions::default())
        .unwrap();

    assert!(raw.windows(4).any(|window| window == b"ping"));
    assert_eq!(processed, b"pong".to_vec());

    channel.close().unwrap();
}

#[test]
fn terminate_on_timeout_tears_the_session_down() {
    let (transport, script) =
        ScriptedTransport::with_auth(vec![Step::new("", "switch01#")], false, "", "");

    let mut args = ChannelArgs::default();
    args.timeout_ops = Duration::from_millis(200);
    args.terminate_on_timeout = true;

    let mut channel = Channel::new(args, transport);

    channel.open().unwrap();

    let err = channel.read_until_explicit(b"never-coming").unwrap_err();

    assert!(matches!(err, ScrawlError::ChannelTimeout { .. }));
    assert!(script.lock().unwrap().closed);
}

#[test]
fn eager_input_skips_echo_and_prompt_synchronization() {
    let (mut channel, script) =
        scripted_channel(vec![Step::new("", "switch01#")], false, "", "");

    channel.open().unwrap();

    let options = OperationOptions {
        eager: true,
        ..OperationOptions::default()
    };

    let (_raw, processed) = channel.send_input("banner line one", &options).unwrap();

    assert_eq!(processed, b"banner line one".to_vec());

    let unlocked_script = script.lock().unwrap();

    assert!(unlocked_script
        .writes
        .iter()
        .any(|write| write.as_slice() == b"banner line one"));

    drop(unlocked_script);

    channel.close().unwrap();
}
