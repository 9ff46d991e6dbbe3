use crate::channel::OperationOptions as ChannelOperationOptions;
use crate::driver::network::driver::Driver as NetworkDriver;
use crate::driver::network::privilege::PrivilegeLevel;
use crate::driver::{
    GenericDriverBuilder,
    NetworkDriverBuilder,
};
use crate::errors::ScrawlError;
use once_cell::sync::OnceCell;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

const ARISTA_EOS_PLATFORM_YAML: &str = include_str!("assets/arista_eos.yaml");
const CISCO_IOSXE_PLATFORM_YAML: &str = include_str!("assets/cisco_iosxe.yaml");
const JUNIPER_JUNOS_PLATFORM_YAML: &str = include_str!("assets/juniper_junos.yaml");

/// An eos prompt only shows the leading characters of a session name, the rest is elided.
const ARISTA_EOS_SESSION_PROMPT_NAME_LEN: usize = 6;

/// Returns a `HashMap` wherein platform names are keys and the included yaml platform (asset)
/// data string is the value.
pub fn get_platforms() -> &'static HashMap<&'static str, &'static str> {
    static PLATFORMS: OnceCell<HashMap<&str, &str>> = OnceCell::new();

    PLATFORMS.get_or_init(|| {
        HashMap::from([
            ("arista_eos", ARISTA_EOS_PLATFORM_YAML),
            ("cisco_iosxe", CISCO_IOSXE_PLATFORM_YAML),
            ("juniper_junos", JUNIPER_JUNOS_PLATFORM_YAML),
        ])
    })
}

/// A privilege level as it appears in platform yaml -- patterns as strings, compiled into a
/// proper `PrivilegeLevel` via `Definition::privilege_levels`.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct PrivilegeLevelRecord {
    /// The privilege level name.
    pub name: String,
    /// The (uncompiled) prompt pattern for the level.
    pub pattern: String,
    /// Sub-strings negating a pattern match.
    #[serde(default)]
    pub not_contains: Vec<String>,
    /// Name of the previous/lower level, empty at the root.
    #[serde(default)]
    pub previous_privilege_level: String,
    /// Command typed at this level to de-escalate back to the previous one.
    #[serde(default)]
    pub deescalate: String,
    /// Name of the next/higher level, empty at the top.
    #[serde(default)]
    pub next_privilege_level: String,
    /// Command typed at the previous level to escalate into this one.
    #[serde(default)]
    pub escalate: String,
    /// Indicates escalation into this level prompts for authentication.
    #[serde(default)]
    pub escalate_auth: bool,
    /// The (uncompiled) pattern of the escalation authentication prompt.
    #[serde(default)]
    pub escalate_prompt: String,
    /// Depth of the level in the graph.
    pub level: u8,
}

/// `Definition` is the data half of a platform -- everything a network driver needs to know
/// about a device flavor that can be expressed as data: prompt/privilege tables, failure
/// indicator strings, and the default privilege level. The code half (on-open/on-close hooks and
/// configuration session support) is matched up by platform name when building a driver.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
pub struct Definition {
    /// The type of the platform, for example "arista_eos" or "cisco_iosxe".
    pub platform_type: String,
    /// The privilege level commands are sent at.
    pub default_desired_privilege_level: String,
    /// Output sub-strings indicating a command failed.
    #[serde(default)]
    pub failed_when_contains: Vec<String>,
    /// The privilege level table.
    pub privilege_levels: Vec<PrivilegeLevelRecord>,
}

impl Definition {
    /// Returns the `Definition` for the given embedded platform name.
    ///
    /// # Errors
    ///
    /// Errors if the platform name is unknown or its yaml does not deserialize (the latter would
    /// be a bug).
    pub fn new(platform_name: &str) -> Result<Self, ScrawlError> {
        let platforms = get_platforms();

        platforms.get(platform_name).map_or_else(
            || {
                Err(ScrawlError::InvalidConfiguration {
                    details: format!("unknown platform name '{platform_name}'"),
                })
            },
            |platform_str| {
                serde_yaml::from_str(platform_str).map_err(|err| {
                    ScrawlError::InvalidConfiguration {
                        details: format!(
                            "failed deserializing embedded platform '{platform_name}', \
                            error: {err}"
                        ),
                    }
                })
            },
        )
    }

    /// Compiles the privilege level records of this definition into `PrivilegeLevel` objects.
    ///
    /// # Errors
    ///
    /// Errors if any pattern in the table fails to compile.
    pub fn privilege_levels(&self) -> Result<Vec<PrivilegeLevel>, ScrawlError> {
        let mut privilege_levels = Vec::with_capacity(self.privilege_levels.len());

        for record in &self.privilege_levels {
            let mut privilege_level =
                PrivilegeLevel::new(record.name.as_str(), record.pattern.as_str(), record.level)?;

            privilege_level.not_contains = record.not_contains.clone();
            privilege_level.previous_privilege_level = record.previous_privilege_level.clone();
            privilege_level.deescalate = record.deescalate.clone();
            privilege_level.next_privilege_level = record.next_privilege_level.clone();
            privilege_level.escalate = record.escalate.clone();
            privilege_level.escalate_auth = record.escalate_auth;
            privilege_level.escalate_prompt = record.escalate_prompt.clone();

            privilege_levels.push(privilege_level);
        }

        Ok(privilege_levels)
    }

    /// Produces a `NetworkDriverBuilder` wired up with this platform's privilege levels, failure
    /// strings, and the platform's hooks (paging disable on open, exit on close, config abort
    /// and configuration session support where the platform has those). Transport/auth settings
    /// stay on the given generic driver builder -- configure those before handing it over.
    ///
    /// # Errors
    ///
    /// Errors if the privilege level table does not compile.
    pub fn network_driver_builder(
        &self,
        generic_driver_builder: GenericDriverBuilder,
    ) -> Result<NetworkDriverBuilder, ScrawlError> {
        let generic_driver_builder =
            generic_driver_builder.failed_when_contains(self.failed_when_contains.clone());

        let mut builder = NetworkDriverBuilder::new(generic_driver_builder)
            .privilege_levels(self.privilege_levels()?)
            .default_desired_privilege_level(self.default_desired_privilege_level.as_str());

        builder = match self.platform_type.as_str() {
            "arista_eos" => builder
                .on_open(arista_eos_on_open)
                .on_close(send_exit_on_close)
                .config_abort(arista_eos_config_abort)
                .configuration_session_builder(arista_eos_configuration_session_builder),
            "cisco_iosxe" => builder
                .on_open(cisco_iosxe_on_open)
                .on_close(send_exit_on_close),
            "juniper_junos" => builder
                .on_open(juniper_junos_on_open)
                .on_close(send_exit_on_close)
                .config_abort(juniper_junos_config_abort),
            _ => builder,
        };

        Ok(builder)
    }
}

fn send_paging_commands(
    d: &mut NetworkDriver,
    commands: &[&str],
) -> Result<(), ScrawlError> {
    d.acquire_privilege_level(d.args.default_desired_privilege_level.clone().as_str())?;

    for command in commands {
        d.generic_driver
            .channel
            .send_input(command, &ChannelOperationOptions::default())?;
    }

    Ok(())
}

fn cisco_iosxe_on_open(d: &mut NetworkDriver) -> Result<(), ScrawlError> {
    send_paging_commands(d, &["terminal length 0", "terminal width 512"])
}

fn arista_eos_on_open(d: &mut NetworkDriver) -> Result<(), ScrawlError> {
    send_paging_commands(d, &["terminal length 0", "terminal width 32767"])
}

fn juniper_junos_on_open(d: &mut NetworkDriver) -> Result<(), ScrawlError> {
    send_paging_commands(d, &["set cli screen-length 0", "set cli screen-width 511"])
}

/// Writes `exit` without waiting on any output -- the device is going to hang up on us, there is
/// no prompt to read back.
fn send_exit_on_close(d: &mut NetworkDriver) -> Result<(), ScrawlError> {
    d.generic_driver.channel.write(b"exit")?;
    d.generic_driver.channel.write_return()
}

fn arista_eos_config_abort(d: &mut NetworkDriver) -> Result<(), ScrawlError> {
    d.generic_driver
        .channel
        .send_input("abort", &ChannelOperationOptions::default())?;

    Ok(())
}

fn juniper_junos_config_abort(d: &mut NetworkDriver) -> Result<(), ScrawlError> {
    d.generic_driver
        .channel
        .send_input("rollback 0", &ChannelOperationOptions::default())?;

    Ok(())
}

/// Builds the `PrivilegeLevel` for a named eos configuration session -- exposed so drivers built
/// outside the platform factory can still wire up eos-style session support.
pub fn arista_eos_configuration_session_builder(
    session_name: &str,
) -> Result<PrivilegeLevel, ScrawlError> {
    if session_name.is_empty()
        || !session_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(ScrawlError::InvalidConfiguration {
            details: format!("'{session_name}' is not a valid eos configuration session name"),
        });
    }

    let prompt_name = &session_name[..session_name.len().min(ARISTA_EOS_SESSION_PROMPT_NAME_LEN)];

    let pattern = format!(
        r"(?im)^[a-z0-9.\-@/:]{{1,48}}\(config\-s\-{}[a-z0-9_.\-]{{0,32}}\)#\s?$",
        regex::escape(prompt_name)
    );

    let mut privilege_level = PrivilegeLevel::new(session_name, pattern.as_str(), 3)?;

    privilege_level.previous_privilege_level = String::from("privilege_exec");
    privilege_level.deescalate = String::from("end");
    privilege_level.escalate = format!("configure session {session_name}");

    Ok(privilege_level)
}

#[cfg(test)]
mod tests {
    use super::{
        arista_eos_configuration_session_builder,
        get_platforms,
        Definition,
    };
    use crate::driver::network::privilege::validate_privilege_levels;
    use crate::errors::ScrawlError;

    #[test]
    fn all_embedded_platforms_deserialize_and_validate() {
        for platform_name in get_platforms().keys() {
            let definition = Definition::new(platform_name).unwrap();

            assert_eq!(&definition.platform_type, platform_name);

            let privilege_levels = definition.privilege_levels().unwrap();

            validate_privilege_levels(&privilege_levels).unwrap();

            assert!(privilege_levels
                .iter()
                .any(|p| p.name == definition.default_desired_privilege_level));
        }
    }

    #[test]
    fn unknown_platform_names_are_rejected() {
        let err = Definition::new("acme_routeros9000").unwrap_err();

        assert!(matches!(err, ScrawlError::InvalidConfiguration { .. }));
    }

    #[test]
    fn iosxe_privilege_patterns_match_expected_prompts() {
        let definition = Definition::new("cisco_iosxe").unwrap();
        let privilege_levels = definition.privilege_levels().unwrap();

        let find = |name: &str| {
            privilege_levels
                .iter()
                .find(|p| p.name == name)
                .unwrap()
        };

        assert!(find("exec").matches("csr1000v>"));
        assert!(find("privilege_exec").matches("csr1000v#"));
        assert!(!find("privilege_exec").matches("csr1000v(config)#"));
        assert!(find("configuration").matches("csr1000v(config)#"));
        assert!(find("special_configuration").matches("csr1000v(config-if)#"));
        assert!(!find("special_configuration").matches("csr1000v(config)#"));
    }

    #[test]
    fn eos_session_builder_builds_a_session_level() {
        let privilege_level = arista_eos_configuration_session_builder("my-session").unwrap();

        assert_eq!(privilege_level.name, "my-session");
        assert_eq!(privilege_level.escalate, "configure session my-session");
        // eos elides long session names in the prompt
        assert!(privilege_level.matches("eos1(config-s-my-ses)#"));
        assert!(!privilege_level.matches("eos1(config)#"));
    }

    #[test]
    fn eos_session_builder_rejects_hostile_names() {
        assert!(arista_eos_configuration_session_builder("").is_err());
        assert!(arista_eos_configuration_session_builder("has space").is_err());
    }
}
