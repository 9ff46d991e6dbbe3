mod common;

use common::{
    Script,
    ScriptedTransport,
    Step,
};
use scrawl::channel::{
    Args as ChannelArgs,
    Channel,
    OperationOptions as ChannelOperationOptions,
    SendInteractiveEvent,
    SendInteractiveEvents,
};
use scrawl::driver::generic::driver::{
    Args as GenericArgs,
    Driver as GenericDriver,
};
use scrawl::driver::network::driver::{
    Args as NetworkArgs,
    Driver as NetworkDriver,
    OperationOptions,
};
use scrawl::errors::ScrawlError;
use scrawl::platform::{
    arista_eos_configuration_session_builder,
    Definition,
};
use regex::bytes::Regex;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::{
    Arc,
    Mutex,
};
use std::time::{
    Duration,
    Instant,
};

const OPS_TIMEOUT: Duration = Duration::from_secs(5);

fn platform_driver(
    platform: &str,
    steps: Vec<Step>,
    timeout_ops: Duration,
) -> (NetworkDriver, Arc<Mutex<Script>>) {
    let definition = Definition::new(platform).unwrap();

    let (transport, script) = ScriptedTransport::new(steps);

    let mut channel_args = ChannelArgs::default();
    channel_args.timeout_ops = timeout_ops;

    let channel = Channel::new(channel_args, transport);

    let mut generic_args = GenericArgs::new("localhost");
    generic_args.failed_when_contains = definition.failed_when_contains.clone();

    let generic_driver = GenericDriver::new(generic_args, channel);

    let mut args = NetworkArgs::default();
    args.secondary_password = String::from("secret");
    args.privilege_levels = definition.privilege_levels().unwrap();
    args.default_desired_privilege_level = definition.default_desired_privilege_level.clone();

    (NetworkDriver::new(generic_driver, args), script)
}

#[test]
fn send_command_returns_clean_output() {
    let (mut driver, _script) = platform_driver(
        "cisco_iosxe",
        vec![
            Step::new("", "csr#"),
            Step::new("show run", "show run"),
            Step::new("\n", "\nhostname r1\ncsr#"),
        ],
        OPS_TIMEOUT,
    );

    driver.open().unwrap();

    let response = driver.send_command("show run").unwrap();

    assert_eq!(response.channel_input, "show run");
    assert_eq!(response.result, "hostname r1");
    assert!(!response.failed);
    // the raw capture keeps the echo, the processed result neither echoes nor ends in a prompt
    assert!(String::from_utf8_lossy(&response.raw_result).contains("show run"));
    assert!(!response.result.ends_with('#'));
    assert!(response.elapsed_time >= chrono::Duration::zero());
    assert_eq!(
        response.elapsed_time,
        response.finish_time - response.start_time
    );

    driver.close().unwrap();
}

#[test]
fn acquiring_privilege_exec_enters_the_enable_password() {
    let (mut driver, script) = platform_driver(
        "cisco_iosxe",
        vec![
            Step::new("", "r1>"),
            Step::new("enable", "enable"),
            Step::new("\n", "\nPassword: "),
            Step::new("secret\n", "\nr1#"),
            Step::new("\n", "\nr1#"),
            Step::new("\n", "r1#"),
        ],
        OPS_TIMEOUT,
    );

    driver.open().unwrap();

    driver.acquire_privilege_level("privilege_exec").unwrap();

    let prompt = driver.get_prompt().unwrap();

    assert_eq!(prompt, "r1#");

    // the enable password did get typed at the device
    assert!(script
        .lock()
        .unwrap()
        .writes
        .iter()
        .any(|write| write.as_slice() == b"secret"));
}

static ABORT_CALLED: AtomicBool = AtomicBool::new(false);

fn send_abort(d: &mut NetworkDriver) -> Result<(), ScrawlError> {
    ABORT_CALLED.store(true, Ordering::SeqCst);

    d.generic_driver
        .channel
        .send_input("abort", &ChannelOperationOptions::default())?;

    Ok(())
}

#[test]
fn failed_config_aborts_and_restores_the_default_privilege_level() {
    let (mut driver, _script) = platform_driver(
        "cisco_iosxe",
        vec![
            Step::new("", "r1#"),
            // escalate into configuration mode
            Step::new("configure terminal", "configure terminal"),
            Step::new("\n", "\nr1(config)#"),
            Step::new("\n", "\nr1(config)#"),
            // first config line lands fine
            Step::new("int g0/0", "int g0/0"),
            Step::new("\n", "\nr1(config-if)#"),
            // second one is garbage
            Step::new("tacocat", "tacocat"),
            Step::new("\n", "\n% Invalid input detected at '^' marker.\nr1(config-if)#"),
            // the abort hook bails out of config mode
            Step::new("abort", "abort"),
            Step::new("\n", "\nr1#"),
            // restore of the default privilege level snapshots the prompt
            Step::new("\n", "\nr1#"),
            Step::new("\n", "r1#"),
        ],
        OPS_TIMEOUT,
    );

    ABORT_CALLED.store(false, Ordering::SeqCst);

    driver.args.config_abort = Some(send_abort);

    driver.open().unwrap();

    let mut options = OperationOptions::default();
    options.generic_driver_operation_options.stop_on_failed = true;

    let multi_response = driver
        .send_configs_with_options(&["int g0/0", "tacocat", "shutdown"], &options)
        .unwrap();

    // the third config never went out
    assert_eq!(multi_response.responses.len(), 2);
    assert!(!multi_response.responses[0].failed);
    assert!(multi_response.responses[1].failed);
    assert!(multi_response.failed);

    assert!(ABORT_CALLED.load(Ordering::SeqCst));

    // and we are back at the default privilege level
    let prompt = driver.get_prompt().unwrap();
    assert_eq!(prompt, "r1#");
}

#[test]
fn interactive_confirmation_dialogs_are_driven_to_completion() {
    let (mut driver, _script) = platform_driver(
        "cisco_iosxe",
        vec![
            Step::new("", "r1#"),
            Step::new("clear logging", "clear logging"),
            Step::new("\n", "\nClear logging buffer [confirm]"),
            Step::new("\n", "\nr1#"),
        ],
        OPS_TIMEOUT,
    );

    driver.open().unwrap();

    let events = SendInteractiveEvents(vec![
        SendInteractiveEvent::new("clear logging", r"Clear logging buffer \[confirm\]"),
        SendInteractiveEvent::new("", ""),
    ]);

    let response = driver
        .send_interactive(events, &OperationOptions::default())
        .unwrap();

    assert!(response.result.contains("Clear logging buffer [confirm]"));
    assert!(response.result.contains("r1#"));
    assert!(!response.failed);
    assert_eq!(
        response.expectation.as_deref(),
        Some(r"Clear logging buffer \[confirm\]")
    );
}

#[test]
fn timed_out_command_leaves_the_session_usable() {
    let (mut driver, script) = platform_driver(
        "cisco_iosxe",
        vec![Step::new("", "csr#")],
        Duration::from_millis(300),
    );

    driver.open().unwrap();

    let started = Instant::now();
    let err = driver.send_command("show version").unwrap_err();

    assert!(matches!(err, ScrawlError::ChannelTimeout { .. }));
    assert!(started.elapsed() < Duration::from_millis(1_500));
    assert!(!script.lock().unwrap().closed);

    {
        let mut unlocked_script = script.lock().unwrap();
        unlocked_script.push_step(Step::new("show run", "show run"));
        unlocked_script.push_step(Step::new("\n", "\nhostname r1\ncsr#"));
    }

    let response = driver.send_command("show run").unwrap();

    assert_eq!(response.result, "hostname r1");
}

#[test]
fn unresolvable_prompts_raise_unknown_privilege_level() {
    let (transport, _script) = ScriptedTransport::new(vec![Step::new("\n", "gibberish$$$\n")]);

    let definition = Definition::new("cisco_iosxe").unwrap();

    let mut channel_args = ChannelArgs::default();
    channel_args.timeout_ops = OPS_TIMEOUT;
    channel_args.auth_bypass = true;

    let channel = Channel::new(channel_args, transport);
    let generic_driver = GenericDriver::new(GenericArgs::new("localhost"), channel);

    let mut args = NetworkArgs::default();
    args.privilege_levels = definition.privilege_levels().unwrap();
    args.default_desired_privilege_level = definition.default_desired_privilege_level.clone();

    let mut driver = NetworkDriver::new(generic_driver, args);

    driver.open().unwrap();

    // a session gone sideways: the device emits something the channel accepts as prompt-ish but
    // that no privilege level pattern claims
    driver.generic_driver.channel.args.prompt_pattern =
        Regex::new(r"(?m)^.*\$\$\$\s*$").unwrap();

    let err = driver
        .acquire_privilege_level("privilege_exec")
        .unwrap_err();

    assert!(matches!(err, ScrawlError::UnknownPrivilegeLevel { .. }));
}

#[test]
fn acquire_is_idempotent_and_round_trips() {
    let (mut driver, script) = platform_driver(
        "cisco_iosxe",
        vec![
            Step::new("", "r1#"),
            Step::new("show clock", "show clock"),
            Step::new("\n", "\n12:00:00\nr1#"),
            Step::new("\n", "\nr1#"),
        ],
        OPS_TIMEOUT,
    );

    driver.open().unwrap();

    driver.acquire_privilege_level("privilege_exec").unwrap();

    driver.send_command("show clock").unwrap();

    driver.acquire_privilege_level("privilege_exec").unwrap();

    // the whole exchange wrote exactly one command -- no escalation/de-escalation traffic
    let command_writes = script.lock().unwrap().command_writes();

    assert_eq!(command_writes, vec![b"show clock".to_vec()]);
}

#[test]
fn acquire_walks_up_and_down_multiple_levels() {
    let (mut driver, _script) = platform_driver(
        "cisco_iosxe",
        vec![
            Step::new("", "r1>"),
            // up: enable (with password), then configure terminal
            Step::new("enable", "enable"),
            Step::new("\n", "\nPassword: "),
            Step::new("secret\n", "\nr1#"),
            Step::new("\n", "\nr1#"),
            Step::new("configure terminal", "configure terminal"),
            Step::new("\n", "\nr1(config)#"),
            Step::new("\n", "\nr1(config)#"),
            // down again: end, then disable
            Step::new("\n", "\nr1(config)#"),
            Step::new("end", "end"),
            Step::new("\n", "\nr1#"),
            Step::new("\n", "\nr1#"),
            Step::new("disable", "disable"),
            Step::new("\n", "\nr1>"),
            Step::new("\n", "\nr1>"),
        ],
        OPS_TIMEOUT,
    );

    driver.open().unwrap();

    driver.acquire_privilege_level("configuration").unwrap();
    driver.acquire_privilege_level("exec").unwrap();
}

#[test]
fn configuration_sessions_register_use_and_deregister() {
    let (mut driver, _script) = platform_driver(
        "arista_eos",
        vec![
            Step::new("", "eos1#"),
            Step::new("configure session mysess", "configure session mysess"),
            Step::new("\n", "\neos1(config-s-mysess)#"),
            Step::new("\n", "\neos1(config-s-mysess)#"),
            Step::new("show configuration sessions", "show configuration sessions"),
            Step::new("\n", "\n* mysess pending\neos1(config-s-mysess)#"),
            Step::new("\n", "\neos1(config-s-mysess)#"),
            Step::new("end", "end"),
            Step::new("\n", "\neos1#"),
            Step::new("\n", "\neos1#"),
        ],
        OPS_TIMEOUT,
    );

    driver.args.configuration_session_builder = Some(arista_eos_configuration_session_builder);

    driver.open().unwrap();

    driver.register_configuration_session("mysess").unwrap();

    // a second registration under the same name must be refused
    let err = driver.register_configuration_session("mysess").unwrap_err();
    assert!(matches!(err, ScrawlError::InvalidConfiguration { .. }));

    let mut options = OperationOptions::default();
    options.privilege_level = String::from("mysess");

    let multi_response = driver
        .send_configs_with_options(&["show configuration sessions"], &options)
        .unwrap();

    assert!(!multi_response.failed);
    assert!(multi_response.responses[0].result.contains("* mysess pending"));

    driver.close().unwrap();

    // the session level is gone again after close
    assert!(!driver
        .args
        .privilege_levels
        .iter()
        .any(|privilege_level| privilege_level.name == "mysess"));
}

#[test]
fn acquire_gives_up_after_twice_the_graph_size() {
    // a device that answers "configure terminal" but stubbornly stays at the exec prompt
    let mut steps = vec![Step::new("", "r1#")];

    for _ in 0..12 {
        steps.push(Step::new("configure terminal", "configure terminal"));
        steps.push(Step::new("\n", "\nr1#"));
        steps.push(Step::new("\n", "\nr1#"));
    }

    let (mut driver, _script) = platform_driver("cisco_iosxe", steps, OPS_TIMEOUT);

    driver.open().unwrap();

    let err = driver.acquire_privilege_level("configuration").unwrap_err();

    assert!(matches!(err, ScrawlError::CouldNotAcquirePrivilegeLevel { .. }));
}

#[test]
fn registration_without_platform_support_is_rejected() {
    let (mut driver, _script) =
        platform_driver("cisco_iosxe", vec![Step::new("", "r1#")], OPS_TIMEOUT);

    driver.open().unwrap();

    let err = driver.register_configuration_session("mysess").unwrap_err();

    assert!(matches!(err, ScrawlError::InvalidConfiguration { .. }));
}
