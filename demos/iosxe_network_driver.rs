extern crate scrawl;

use env_logger::{
    Builder,
    Target,
};
use log::LevelFilter;
use scrawl::driver::{
    GenericDriverBuilder,
    NetworkDriver,
};
use scrawl::platform::Definition;
use std::env;

// obviously set these to whatever you want to test with!
const ENABLE_LOGGING: bool = false;
const HOST: &str = "XYZ";
const USER: &str = "XYZ";
const PASSWORD: &str = "XYZ";
const SECONDARY_PASSWORD: &str = "XYZ";
const DEV_NULL: &str = "/dev/null";
const COMMAND: &str = "show version | i Version";
const CONFIGS: [&str; 2] = ["interface loopback999", "description scrawl was here"];

/// Enable (or not) some logging for our demo.
fn enable_logging() {
    if !ENABLE_LOGGING {
        return;
    }

    env::set_var("RUST_LOG", "DEBUG");

    let mut builder = Builder::from_default_env();

    builder.target(Target::Stdout);
    builder.filter_level(LevelFilter::Debug);

    env_logger::init();
}

/// Build and return an iosxe network driver from the embedded platform definition -- transport
/// and auth settings go on the generic builder, the platform definition supplies the rest.
fn setup_connection() -> NetworkDriver {
    let generic_builder = GenericDriverBuilder::new(HOST)
        .user(USER)
        .password(PASSWORD)
        .ssh_strict_key(false)
        .ssh_config_file_path(DEV_NULL);

    let definition = Definition::new("cisco_iosxe").expect("failed loading platform definition");

    definition
        .network_driver_builder(generic_builder)
        .expect("failed building driver builder")
        .secondary_password(SECONDARY_PASSWORD)
        .build()
}

/// Open a connection with a network driver, fetch the prompt, send a command and some configs,
/// and print out what came back.
fn main() {
    enable_logging();

    let mut driver = setup_connection();

    driver.open().expect("failed opening connection");

    let prompt = driver.get_prompt().expect("failed finding device prompt");

    println!("found device prompt: {prompt}");

    let response = driver.send_command(COMMAND).expect("failed sending command");

    println!(
        "command '{}' took {} milliseconds, output:\n{}\n",
        COMMAND,
        response.elapsed_time.num_milliseconds(),
        response.result
    );

    let multi_response = driver
        .send_configs(&CONFIGS)
        .expect("failed sending configs");

    println!(
        "configs applied in {} milliseconds, failed: {}",
        multi_response.elapsed_time.num_milliseconds(),
        multi_response.failed
    );

    driver.close().expect("failed closing connection");
}
