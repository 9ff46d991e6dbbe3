use crate::channel::{
    OperationOptions as ChannelOperationOptions,
    SendInteractiveEvent,
    SendInteractiveEvents,
};
use crate::driver::network::privilege::{
    joined_prompt_pattern,
    validate_privilege_levels,
    PrivilegeLevel,
};
use crate::driver::{
    GenericDriver,
    GenericDriverOperationOptions,
};
use crate::errors::ScrawlError;
use crate::response::{
    MultiResponse,
    Response,
    HIDDEN_INPUT_MASK,
};
use log::{
    debug,
    info,
};

const DEFAULT_CONFIGURATION_PRIVILEGE_LEVEL: &str = "configuration";

/// The custom type for network driver on open/close callables. The `on_open` callable will be
/// executed immediately after authentication (after the *generic* driver on open callable, if
/// set), while the `on_close` variant will be called before the generic driver close path.
/// Hooks receive the driver mutably and must use only public channel/driver operations.
pub type NetworkDriverOnXCallable = fn(d: &mut Driver) -> Result<(), ScrawlError>;

/// The custom type for configuration session level builders -- given a session name, produce the
/// `PrivilegeLevel` describing that named session (prompt pattern, escalation command, edges).
/// Supplied per-platform; see the arista eos platform for the reference implementation.
pub type ConfigurationSessionBuilder =
    fn(session_name: &str) -> Result<PrivilegeLevel, ScrawlError>;

/// `OperationOptions` holds arguments that apply to `Driver` operations (ex: `send_command`).
#[derive(Default, Clone)]
pub struct OperationOptions {
    /// The "generic driver" `OperationOptions` which includes the even "lower level" channel
    /// `OperationOptions`.
    pub generic_driver_operation_options: GenericDriverOperationOptions,
    /// The privilege level to execute the input in -- this applies to `send_configs` and
    /// `send_interactive`; the `send_command`/`send_commands` methods always acquire the
    /// `default_desired_privilege_level`.
    pub privilege_level: String,
}

#[derive(Debug)]
enum PrivilegeAction {
    NoOp,
    Escalate,
    Deescalate,
}

/// The (network) `Driver` arguments.
pub struct Args {
    /// The "secondary" auth password (usually the "enable" password, or "sudo/root" password).
    pub secondary_password: String,
    /// The privilege levels for the `Driver` -- defines modes such as "exec", "privilege_exec",
    /// or "configuration" and the transitions between them.
    pub privilege_levels: Vec<PrivilegeLevel>,
    /// The privilege level that is considered "default" -- the level "commands" (not configs!)
    /// are sent at, acquired automatically before any send_command(s) operation.
    pub default_desired_privilege_level: String,
    /// The "on open" callable that is executed (if set) after authenticating, and after the (if
    /// set) *generic* driver open callable is executed.
    pub on_open: Option<NetworkDriverOnXCallable>,
    /// The "on close" callable that is executed (if set) right before executing the *generic*
    /// driver close path.
    pub on_close: Option<NetworkDriverOnXCallable>,
    /// Callable executed to bail out of a broken configuration attempt -- invoked by
    /// `send_configs` when a config line fails and `stop_on_failed` is set, *before* the default
    /// privilege level is restored (ex: send "abort" on eos).
    pub config_abort: Option<NetworkDriverOnXCallable>,
    /// Callable that produces the `PrivilegeLevel` for a named configuration session on
    /// platforms that support those.
    pub configuration_session_builder: Option<ConfigurationSessionBuilder>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            secondary_password: String::new(),
            privilege_levels: vec![],
            default_desired_privilege_level: String::new(),
            on_open: None,
            on_close: None,
            config_abort: None,
            configuration_session_builder: None,
        }
    }
}

/// Driver -- or Network Driver -- is a network driver implementation that builds on the generic
/// driver and adds "network smarts", foremost an understanding of privilege levels and how to
/// move between them.
pub struct Driver {
    /// The underlying `GenericDriver`.
    pub generic_driver: GenericDriver,
    /// The `Driver` arguments (typically provided by a user or from a "platform").
    pub args: Args,

    current_privilege_level: String,
    registered_configuration_sessions: Vec<String>,
}

impl Driver {
    /// Create a new (network) Driver instance.
    #[must_use]
    pub fn new(
        generic_driver: GenericDriver,
        args: Args,
    ) -> Self {
        Self {
            generic_driver,
            args,
            current_privilege_level: String::new(),
            registered_configuration_sessions: vec![],
        }
    }

    /// Re-validates the privilege level graph and pushes the regenerated "joined" prompt pattern
    /// down onto the channel. Runs automatically at open and whenever configuration sessions are
    /// registered/deregistered -- call it yourself only if you mutate `args.privilege_levels`
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfiguration` error if the graph is invalid or the joined pattern
    /// cannot be compiled.
    pub fn update_privileges(&mut self) -> Result<(), ScrawlError> {
        validate_privilege_levels(&self.args.privilege_levels)?;

        self.generic_driver.channel.args.prompt_pattern =
            joined_prompt_pattern(&self.args.privilege_levels)?;

        Ok(())
    }

    /// Open the driver and the underlying channel and transport.
    ///
    /// # Errors
    ///
    /// Can return an error if the privilege levels/default privilege level are unset or invalid,
    /// if opening the underlying `generic_driver` fails, or if the `on_open` callable is set and
    /// it returns an error.
    pub fn open(&mut self) -> Result<(), ScrawlError> {
        if self.args.default_desired_privilege_level.is_empty()
            || self.args.privilege_levels.is_empty()
        {
            return Err(ScrawlError::InvalidConfiguration {
                details: String::from(
                    "default desired privilege level and/or privilege levels are unset, these \
                    are required with 'network' driver",
                ),
            });
        }

        self.update_privileges()?;

        self.generic_driver.open()?;

        if let Some(f) = self.args.on_open {
            debug!("network driver `on_open` set, executing");

            f(self)?;
        }

        Ok(())
    }

    /// Close the driver and the underlying channel and transport. Any configuration session
    /// levels registered during the connection's life are removed.
    ///
    /// # Errors
    ///
    /// Can return an error if closing the underlying `generic_driver` fails or the `on_close`
    /// callable errors.
    pub fn close(&mut self) -> Result<(), ScrawlError> {
        if let Some(f) = self.args.on_close {
            debug!("network driver `on_close` set, executing");

            f(self)?;
        }

        if !self.registered_configuration_sessions.is_empty() {
            let registered = std::mem::take(&mut self.registered_configuration_sessions);

            self.args
                .privilege_levels
                .retain(|privilege_level| !registered.contains(&privilege_level.name));

            self.update_privileges()?;
        }

        self.current_privilege_level = String::new();

        self.generic_driver.close()
    }

    fn find_privilege_level(
        &self,
        name: &str,
    ) -> Result<&PrivilegeLevel, ScrawlError> {
        self.args
            .privilege_levels
            .iter()
            .find(|privilege_level| privilege_level.name == name)
            .ok_or_else(|| ScrawlError::InvalidConfiguration {
                details: format!("'{name}' is not a known privilege level"),
            })
    }

    /// Resolves a prompt string to a privilege level name. Overlapping matches (a sub-config
    /// mode matching both its own pattern and a broader one) resolve to the deepest `level`; two
    /// matches at the same depth mean the patterns are not specific enough to tell apart.
    fn determine_current_privilege_level(
        &self,
        current_prompt: &str,
    ) -> Result<String, ScrawlError> {
        let mut matched: Vec<&PrivilegeLevel> = self
            .args
            .privilege_levels
            .iter()
            .filter(|privilege_level| privilege_level.matches(current_prompt))
            .collect();

        matched.sort_by_key(|privilege_level| privilege_level.level);

        match matched.as_slice() {
            [] => Err(ScrawlError::UnknownPrivilegeLevel {
                prompt: current_prompt.to_owned(),
            }),
            [only] => Ok(only.name.clone()),
            [.., second_deepest, deepest] => {
                if deepest.level == second_deepest.level {
                    return Err(ScrawlError::UnknownPrivilegeLevel {
                        prompt: format!(
                            "{current_prompt} (matched multiple privilege levels at equal depth)"
                        ),
                    });
                }

                Ok(deepest.name.clone())
            }
        }
    }

    fn deescalate_privilege_level(
        &mut self,
        current_privilege_level: &str,
    ) -> Result<(), ScrawlError> {
        let (deescalate, previous) = {
            let current = self.find_privilege_level(current_privilege_level)?;

            (
                current.deescalate.clone(),
                current.previous_privilege_level.clone(),
            )
        };

        if deescalate.is_empty() || previous.is_empty() {
            return Err(ScrawlError::CouldNotAcquirePrivilegeLevel {
                target: format!("below '{current_privilege_level}' (no de-escalation edge)"),
            });
        }

        self.generic_driver
            .channel
            .send_input(deescalate.as_str(), &ChannelOperationOptions::default())?;

        Ok(())
    }

    /// Escalate one step up from `current_privilege_level`. The step normally follows the
    /// current level's `next_privilege_level` edge, except when the *target* hangs directly off
    /// the current level (a named configuration session, say) -- then we step into the target
    /// itself. The entered level carries the escalation command/auth data.
    fn escalate_privilege_level(
        &mut self,
        current_privilege_level: &str,
        target_privilege_level: &str,
    ) -> Result<(), ScrawlError> {
        let target_previous = self
            .find_privilege_level(target_privilege_level)?
            .previous_privilege_level
            .clone();

        let next_name = if target_previous == current_privilege_level {
            target_privilege_level.to_owned()
        } else {
            self.find_privilege_level(current_privilege_level)?
                .next_privilege_level
                .clone()
        };

        if next_name.is_empty() {
            return Err(ScrawlError::CouldNotAcquirePrivilegeLevel {
                target: format!("above '{current_privilege_level}' (no escalation edge)"),
            });
        }

        let (escalate, escalate_auth, escalate_prompt, next_pattern) = {
            let next = self.find_privilege_level(next_name.as_str())?;

            (
                next.escalate.clone(),
                next.escalate_auth,
                next.escalate_prompt.clone(),
                next.pattern.to_string(),
            )
        };

        if escalate.is_empty() {
            return Err(ScrawlError::CouldNotAcquirePrivilegeLevel {
                target: format!("'{next_name}' (no escalation command)"),
            });
        }

        if !escalate_auth || self.args.secondary_password.is_empty() {
            if escalate_auth {
                info!(
                    "no secondary password set, but escalate target may require auth, trying \
                    with no password..."
                );
            }

            self.generic_driver
                .channel
                .send_input(escalate.as_str(), &ChannelOperationOptions::default())?;

            return Ok(());
        }

        let events = SendInteractiveEvents(vec![
            SendInteractiveEvent::new(escalate.as_str(), escalate_prompt.as_str()),
            SendInteractiveEvent::new_hidden(
                self.args.secondary_password.clone().as_str(),
                next_pattern.as_str(),
            ),
        ]);

        self.generic_driver
            .channel
            .send_interactive(&events, &ChannelOperationOptions::default())?;

        Ok(())
    }

    /// Acquire the target privilege level -- snapshots the current prompt, resolves it to a
    /// level, and walks escalation/de-escalation edges (entering escalation credentials via
    /// `args.secondary_password` where needed) until the target is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested level is unknown, the current prompt cannot be resolved
    /// to a level, or the edge-walk exceeds twice the graph size without arriving
    /// (`CouldNotAcquirePrivilegeLevel`).
    pub fn acquire_privilege_level(
        &mut self,
        target_privilege_level: &str,
    ) -> Result<(), ScrawlError> {
        info!(
            "acquire privilege level requested, target privilege level: {}",
            target_privilege_level
        );

        let target_level = self.find_privilege_level(target_privilege_level)?.level;

        // until we land somewhere the tracked level is unknown
        self.current_privilege_level = String::new();

        let mut action_count: usize = 0;

        loop {
            let current_prompt = self.generic_driver.get_prompt()?;

            let current_privilege_level =
                self.determine_current_privilege_level(current_prompt.as_str())?;

            let action = if current_privilege_level == target_privilege_level {
                PrivilegeAction::NoOp
            } else if self.find_privilege_level(current_privilege_level.as_str())?.level
                > target_level
            {
                PrivilegeAction::Deescalate
            } else {
                PrivilegeAction::Escalate
            };

            match action {
                PrivilegeAction::NoOp => {
                    debug!("acquire privilege determined no action necessary");

                    self.current_privilege_level = current_privilege_level;

                    return Ok(());
                }
                PrivilegeAction::Escalate => {
                    debug!("acquire privilege determined privilege escalation is necessary");

                    self.escalate_privilege_level(
                        current_privilege_level.as_str(),
                        target_privilege_level,
                    )?;
                }
                PrivilegeAction::Deescalate => {
                    debug!("acquire privilege determined privilege deescalation is necessary");

                    self.deescalate_privilege_level(current_privilege_level.as_str())?;
                }
            }

            action_count += 1;

            if action_count > self.args.privilege_levels.len() * 2 {
                return Err(ScrawlError::CouldNotAcquirePrivilegeLevel {
                    target: target_privilege_level.to_owned(),
                });
            }
        }
    }

    /// Sends the command string to the device and returns a `Response` object. This method will
    /// always ensure that the input is sent at the `default_desired_privilege_level`.
    ///
    /// # Errors
    ///
    /// This function returns an error if the underlying generic driver/channel encounter an
    /// error sending the input. This function does *not* error if any `failed_when_contains`
    /// output is encountered, *but* the returned `Response` will indicate a failed state.
    pub fn send_command(
        &mut self,
        command: &str,
    ) -> Result<Response, ScrawlError> {
        self.send_command_with_options(command, &OperationOptions::default())
    }

    /// As `send_command` but with an options struct provided.
    ///
    /// # Errors
    ///
    /// See `send_command`.
    pub fn send_command_with_options(
        &mut self,
        command: &str,
        options: &OperationOptions,
    ) -> Result<Response, ScrawlError> {
        self.acquire_default_privilege_level()?;

        self.generic_driver
            .send_command_with_options(command, &options.generic_driver_operation_options)
    }

    /// Sends a list of commands to the device and returns a `MultiResponse` object, always at
    /// the `default_desired_privilege_level`. With `stop_on_failed` set (on the generic driver
    /// options), a failed command stops the remaining commands from being issued -- the partial
    /// `MultiResponse` is still returned.
    ///
    /// # Errors
    ///
    /// See `send_command`.
    pub fn send_commands(
        &mut self,
        commands: &[&str],
    ) -> Result<MultiResponse, ScrawlError> {
        self.send_commands_with_options(commands, &OperationOptions::default())
    }

    /// As `send_commands` but with an options struct provided.
    ///
    /// # Errors
    ///
    /// See `send_command`.
    pub fn send_commands_with_options(
        &mut self,
        commands: &[&str],
        options: &OperationOptions,
    ) -> Result<MultiResponse, ScrawlError> {
        self.acquire_default_privilege_level()?;

        self.generic_driver
            .send_commands_with_options(commands, &options.generic_driver_operation_options)
    }

    /// Sends the config lines to the device and returns a `MultiResponse` object. The operation
    /// runs in the privilege level named in the given options, or "configuration" when the
    /// options name none; the `default_desired_privilege_level` is restored afterwards either
    /// way. If a config line fails and `stop_on_failed` is set, the platform's config-abort hook
    /// (if any) runs before the default privilege level is restored.
    ///
    /// # Errors
    ///
    /// See `send_command` -- additionally errors if the configuration privilege level cannot be
    /// acquired or restored.
    pub fn send_configs(
        &mut self,
        configs: &[&str],
    ) -> Result<MultiResponse, ScrawlError> {
        self.send_configs_with_options(configs, &OperationOptions::default())
    }

    /// As `send_configs` but with an options struct provided.
    ///
    /// # Errors
    ///
    /// See `send_configs`.
    pub fn send_configs_with_options(
        &mut self,
        configs: &[&str],
        options: &OperationOptions,
    ) -> Result<MultiResponse, ScrawlError> {
        if configs.is_empty() {
            return Err(ScrawlError::InvalidConfiguration {
                details: String::from("send_configs called with empty vec of configs"),
            });
        }

        let target_privilege_level = if options.privilege_level.is_empty() {
            DEFAULT_CONFIGURATION_PRIVILEGE_LEVEL
        } else {
            options.privilege_level.as_str()
        };

        self.acquire_privilege_level(target_privilege_level)?;

        let mut multi_response = MultiResponse::new(self.generic_driver.args.host.as_str());

        for config in configs {
            let response = self
                .generic_driver
                .send_command_with_options(config, &options.generic_driver_operation_options)?;

            let failed = response.failed;

            multi_response.record_response(response);

            if options.generic_driver_operation_options.stop_on_failed && failed {
                info!(
                    "stop on failed is true and a config failed, discontinuing send configs \
                    operation"
                );

                if let Some(f) = self.args.config_abort {
                    debug!("network driver `config_abort` set, executing");

                    f(self)?;
                }

                break;
            }
        }

        self.acquire_privilege_level(
            self.args.default_desired_privilege_level.clone().as_str(),
        )?;

        Ok(multi_response)
    }

    /// Drives a scripted interactive exchange (confirmation dialogs and the like) at the
    /// privilege level named in the given options (default: `default_desired_privilege_level`)
    /// and returns its `Response` -- the response carries the expectation/reply/finale of the
    /// exchange, with hidden replies masked.
    ///
    /// # Errors
    ///
    /// See `send_command`.
    pub fn send_interactive(
        &mut self,
        events: SendInteractiveEvents,
        options: &OperationOptions,
    ) -> Result<Response, ScrawlError> {
        if events.is_empty() {
            return Err(ScrawlError::InvalidConfiguration {
                details: String::from("send_interactive called with empty vec of events"),
            });
        }

        let target_privilege_level = if options.privilege_level.is_empty() {
            self.args.default_desired_privilege_level.clone()
        } else {
            options.privilege_level.clone()
        };

        self.acquire_privilege_level(target_privilege_level.as_str())?;

        let channel_input = events
            .iter()
            .map(|event| {
                if event.hidden {
                    HIDDEN_INPUT_MASK
                } else {
                    event.input.as_str()
                }
            })
            .collect::<Vec<&str>>()
            .join(", ");

        let expectation = events
            .iter()
            .find(|event| !event.response.is_empty())
            .map(|event| event.response.clone());

        let reply = events.get(1).map(|event| {
            if event.hidden {
                HIDDEN_INPUT_MASK.to_owned()
            } else {
                event.input.clone()
            }
        });

        let finale = events.last().map_or_else(
            || self.generic_driver.channel.args.prompt_pattern.to_string(),
            |event| {
                if event.response.is_empty() {
                    self.generic_driver.channel.args.prompt_pattern.to_string()
                } else {
                    event.response.clone()
                }
            },
        );

        let mut failed_when_contains = options
            .generic_driver_operation_options
            .failed_when_contains
            .clone();

        if failed_when_contains.is_empty() {
            failed_when_contains = self.generic_driver.args.failed_when_contains.clone();
        }

        let mut response = Response::new_interactive(
            channel_input.as_str(),
            self.generic_driver.args.host.as_str(),
            self.generic_driver.args.port,
            expectation,
            reply,
            Some(finale),
            failed_when_contains,
        );

        let rb = self.generic_driver.channel.send_interactive(
            &events,
            &options
                .generic_driver_operation_options
                .channel_operation_options,
        )?;

        response.record(rb.clone(), rb);

        Ok(response)
    }

    /// Convenience method to get the device prompt from the channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying channel errored on the `get_prompt` call.
    pub fn get_prompt(&mut self) -> Result<String, ScrawlError> {
        self.generic_driver.get_prompt()
    }

    /// Registers a named configuration session with the driver -- the platform's configuration
    /// session builder produces a new `PrivilegeLevel` for the session (prompt pattern plus the
    /// `configure session <name>`-style escalation), which is inserted into the privilege graph
    /// so the session can be targeted like any other level (ex: via `send_configs` options).
    /// Registered sessions are removed again when the driver closes.
    ///
    /// Must not be called while another operation is in flight (a `&mut` receiver enforces
    /// exactly that).
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfiguration` error if the platform has no configuration session
    /// support, the name collides with an existing level, or the resulting graph is invalid.
    pub fn register_configuration_session(
        &mut self,
        session_name: &str,
    ) -> Result<(), ScrawlError> {
        let Some(builder) = self.args.configuration_session_builder else {
            return Err(ScrawlError::InvalidConfiguration {
                details: String::from(
                    "platform does not support named configuration sessions",
                ),
            });
        };

        if self
            .args
            .privilege_levels
            .iter()
            .any(|privilege_level| privilege_level.name == session_name)
        {
            return Err(ScrawlError::InvalidConfiguration {
                details: format!(
                    "cannot register configuration session '{session_name}', a privilege level \
                    with that name already exists"
                ),
            });
        }

        let session_privilege_level = builder(session_name)?;

        self.args.privilege_levels.push(session_privilege_level);
        self.registered_configuration_sessions
            .push(session_name.to_owned());

        self.update_privileges()
    }

    fn acquire_default_privilege_level(&mut self) -> Result<(), ScrawlError> {
        if self.current_privilege_level != self.args.default_desired_privilege_level {
            debug!(
                "not at the default desired privilege level, attempting to acquire it before \
                sending input"
            );

            self.acquire_privilege_level(
                self.args.default_desired_privilege_level.clone().as_str(),
            )?;
        }

        Ok(())
    }
}
