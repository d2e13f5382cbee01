//! Built-in Shell Commands
//!
//! Session and console commands: help, ver, cls, echo, cd, color, exit,
//! poweroff, reboot

use std::io::Write;

use crate::config;
use crate::shell::{Command, ShellContext, ShellError, write_usage};
use crate::terminal;

// ============================================================================
// Help Command
// ============================================================================

/// Help command - lists commands or shows one command's usage
pub struct HelpCommand;

impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "HELP"
    }
    fn description(&self) -> &'static str {
        "Provides help information for commands."
    }
    fn usage(&self) -> &'static str {
        "HELP [command]"
    }

    fn execute(
        &self,
        args: &str,
        out: &mut dyn Write,
        _ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        let registry = super::create_default_registry();

        if !args.is_empty() {
            return match registry.find(args) {
                Some(cmd) => write_usage(cmd, out),
                None => {
                    writeln!(out, "This command is not supported by the help utility.")?;
                    Ok(())
                }
            };
        }

        writeln!(out, "Built-ins:")?;
        for cmd in registry.commands() {
            writeln!(out, "  {:<10} {}", cmd.name(), cmd.description())?;
        }
        writeln!(out)?;
        writeln!(out, "Type HELP <command> or <command> /? for details.")?;
        Ok(())
    }
}

/// Static instance
pub static HELP_CMD: HelpCommand = HelpCommand;

// ============================================================================
// Ver Command
// ============================================================================

/// Ver command - shows the version
pub struct VerCommand;

impl Command for VerCommand {
    fn name(&self) -> &'static str {
        "VER"
    }
    fn description(&self) -> &'static str {
        "Displays the version."
    }

    fn execute(
        &self,
        _args: &str,
        out: &mut dyn Write,
        _ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        writeln!(out, "{} {}", config::PRODUCT_NAME, config::VERSION)?;
        Ok(())
    }
}

/// Static instance
pub static VER_CMD: VerCommand = VerCommand;

// ============================================================================
// Cls Command
// ============================================================================

/// Cls command - clears the screen
pub struct ClsCommand;

impl Command for ClsCommand {
    fn name(&self) -> &'static str {
        "CLS"
    }
    fn description(&self) -> &'static str {
        "Clears the screen."
    }

    fn execute(
        &self,
        _args: &str,
        out: &mut dyn Write,
        _ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        out.write_all(terminal::CLEAR_SCREEN.as_bytes())?;
        Ok(())
    }
}

/// Static instance
pub static CLS_CMD: ClsCommand = ClsCommand;

// ============================================================================
// Echo Command
// ============================================================================

/// Echo command - prints text or toggles the prompt
pub struct EchoCommand;

impl Command for EchoCommand {
    fn name(&self) -> &'static str {
        "ECHO"
    }
    fn description(&self) -> &'static str {
        "Displays messages, or turns the prompt on or off."
    }
    fn usage(&self) -> &'static str {
        "ECHO [ON | OFF]\nECHO [message]"
    }

    fn execute(
        &self,
        args: &str,
        out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        if args.is_empty() {
            let state = if ctx.echo() { "on" } else { "off" };
            writeln!(out, "ECHO is {}.", state)?;
        } else if args.eq_ignore_ascii_case("on") {
            ctx.set_echo(true);
        } else if args.eq_ignore_ascii_case("off") {
            ctx.set_echo(false);
        } else {
            // `ECHO.` prints an empty line
            let text = args.strip_prefix('.').unwrap_or(args);
            writeln!(out, "{}", text)?;
        }
        Ok(())
    }
}

/// Static instance
pub static ECHO_CMD: EchoCommand = EchoCommand;

// ============================================================================
// Cd Command
// ============================================================================

/// Cd command - shows or changes the current directory
pub struct CdCommand;

impl Command for CdCommand {
    fn name(&self) -> &'static str {
        "CD"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["CHDIR"]
    }
    fn description(&self) -> &'static str {
        "Displays the name of or changes the current directory."
    }
    fn usage(&self) -> &'static str {
        "CD [path]\nCHDIR [path]"
    }

    fn execute(
        &self,
        args: &str,
        out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        if args.is_empty() {
            writeln!(out, "{}", ctx.dos_cwd())?;
            return Ok(());
        }
        ctx.change_dir(args)
    }
}

/// Static instance
pub static CD_CMD: CdCommand = CdCommand;

// ============================================================================
// Color Command
// ============================================================================

/// Color command - sets and persists the console colors
pub struct ColorCommand;

impl Command for ColorCommand {
    fn name(&self) -> &'static str {
        "COLOR"
    }
    fn description(&self) -> &'static str {
        "Sets the default console foreground and background colors."
    }
    fn usage(&self) -> &'static str {
        "COLOR [attr]\n\n  attr  Two hex digits: background then foreground.\n        \
         0 = Black   8 = Gray\n        1 = Blue    9 = Light Blue\n        \
         2 = Green   A = Light Green\n        3 = Aqua    B = Light Aqua\n        \
         4 = Red     C = Light Red\n        5 = Purple  D = Light Purple\n        \
         6 = Yellow  E = Light Yellow\n        7 = White   F = Bright White\n\n\
         COLOR with no argument restores the default (07)."
    }

    fn execute(
        &self,
        args: &str,
        out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        let attr = if args.is_empty() {
            config::DEFAULT_COLOR
        } else {
            terminal::parse_color(args).ok_or(ShellError::SyntaxError)?
        };
        if (attr >> 4) == (attr & 0x0F) {
            return Err(ShellError::InvalidParameter(String::from(args)));
        }

        out.write_all(terminal::color_escape(attr).as_bytes())?;
        ctx.set_color(attr);
        if let Some(path) = ctx.color_file() {
            if let Err(e) = config::save_color(path, attr) {
                log::warn!("cannot persist color to {}: {}", path.display(), e);
            }
        }
        Ok(())
    }
}

/// Static instance
pub static COLOR_CMD: ColorCommand = ColorCommand;

// ============================================================================
// Exit Command
// ============================================================================

/// Exit command - leaves the shell unless it is init
pub struct ExitCommand;

impl Command for ExitCommand {
    fn name(&self) -> &'static str {
        "EXIT"
    }
    fn description(&self) -> &'static str {
        "Quits the shell."
    }

    fn execute(
        &self,
        _args: &str,
        out: &mut dyn Write,
        ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        if ctx.is_init() {
            writeln!(out, "Cannot exit the init shell. Use POWEROFF or REBOOT.")?;
            return Ok(());
        }
        Err(ShellError::Exit)
    }
}

/// Static instance
pub static EXIT_CMD: ExitCommand = ExitCommand;

// ============================================================================
// Power Commands
// ============================================================================

/// Poweroff command - halts the machine
pub struct PowerOffCommand;

impl Command for PowerOffCommand {
    fn name(&self) -> &'static str {
        "POWEROFF"
    }
    fn description(&self) -> &'static str {
        "Powers off the machine."
    }

    fn execute(
        &self,
        _args: &str,
        _out: &mut dyn Write,
        _ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        Err(ShellError::PowerOff)
    }
}

/// Static instance
pub static POWEROFF_CMD: PowerOffCommand = PowerOffCommand;

/// Reboot command - restarts the machine
pub struct RebootCommand;

impl Command for RebootCommand {
    fn name(&self) -> &'static str {
        "REBOOT"
    }
    fn description(&self) -> &'static str {
        "Restarts the machine."
    }

    fn execute(
        &self,
        _args: &str,
        _out: &mut dyn Write,
        _ctx: &mut ShellContext,
    ) -> Result<(), ShellError> {
        Err(ShellError::Reboot)
    }
}

/// Static instance
pub static REBOOT_CMD: RebootCommand = RebootCommand;

// ============================================================================
// Unit Tests
// ============================================================================
