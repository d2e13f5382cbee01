//! DOS-modern init shell
//!
//! Startup order matters when running as PID 1: the logger goes up first
//! (it writes to fd 2, whatever that ends up being), then the console is
//! attached, filesystems mounted and SIGCHLD wired before the first prompt.

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use dosmodern::config::{self, Cli, Config};
use dosmodern::shell::{self, CommandRegistry, Flow, ShellContext};
use dosmodern::{boot, console, terminal};

/// Pause before retrying the console after end of input as init
const EOF_RETRY: Duration = Duration::from_secs(1);

/// Command text of one input line: everything before the first CR or LF,
/// at most `MAX_LINE` bytes.
fn line_text(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(raw.len())
        .min(config::MAX_LINE);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Read one line from stdin; `None` at end of input
fn read_line(buf: &mut Vec<u8>) -> Option<String> {
    buf.clear();
    // The lock is released before the command runs so COPY CON can read
    match io::stdin().lock().read_until(b'\n', buf) {
        Ok(0) => None,
        Ok(_) => Some(line_text(buf)),
        Err(e) => {
            log::warn!("console read failed: {}", e);
            None
        }
    }
}

/// Prompt, read, dispatch until a command asks to leave
fn prompt_loop(registry: &CommandRegistry, ctx: &mut ShellContext) -> Flow {
    let mut buf = Vec::with_capacity(config::MAX_LINE);

    loop {
        boot::reap_children();

        if ctx.echo() {
            console::print(&ctx.prompt());
        }

        let Some(line) = read_line(&mut buf) else {
            if ctx.is_init() {
                thread::sleep(EOF_RETRY);
                continue;
            }
            return Flow::Exit;
        };

        let mut out = io::stdout().lock();
        let result = shell::execute_line(&line, registry, ctx, &mut out);
        if result.flow != Flow::Continue {
            return result.flow;
        }
    }
}

/// PID 1 setup: session, console, mounts, child reaping
fn bootstrap(config: &Config) {
    boot::become_session_leader();
    if let Err(e) = boot::attach_console() {
        log::warn!("cannot open {}: {}", boot::CONSOLE_DEVICE, e);
    }
    if config.mount {
        boot::mount_basic_fs();
    }
    if let Err(e) = boot::install_sigchld_handler() {
        log::warn!("cannot install SIGCHLD handler: {}", e);
    }
    log::info!("bootstrap complete");
}

fn main() -> ExitCode {
    let cli = Cli::parse_lenient();
    let (mut config, warning) = Config::load_or_default(cli.config_path());
    config.apply_cli(&cli);

    console::init_logger(config.log_level_filter());
    if let Some(e) = warning {
        log::warn!("{}; using defaults", e);
    }

    let init = boot::is_init();
    if init {
        bootstrap(&config);
    }

    let mut ctx = ShellContext::new(&config.root);
    ctx.set_init(init);
    if let Some(attr) = config::load_color(&config.color_file) {
        ctx.set_color(attr);
        console::print(&terminal::color_escape(attr));
    }
    ctx.set_color_file(Some(config.color_file.clone()));

    console::print(&format!("\n{} init shell\n", config::PRODUCT_NAME));
    console::print("Type 'help' or 'poweroff'\n\n");

    let registry = shell::create_default_registry();
    loop {
        let flow = prompt_loop(&registry, &mut ctx);
        if !init {
            if flow != Flow::Exit {
                log::info!("not init, {:?} just ends the shell", flow);
            }
            console::print(terminal::RESET_ATTRIBUTES);
            return ExitCode::SUCCESS;
        }

        let err = match flow {
            Flow::PowerOff => boot::power_off(),
            Flow::Reboot => boot::reboot(),
            Flow::Exit | Flow::Continue => continue,
        };
        log::error!("{:?} failed: {}", flow, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_text_strips_line_end() {
        assert_eq!(line_text(b"dir /w\r\n"), "dir /w");
        assert_eq!(line_text(b"ver"), "ver");
        assert_eq!(line_text(b"\n"), "");
    }

    #[test]
    fn test_line_text_caps_length() {
        let long = vec![b'x'; config::MAX_LINE + 10];
        assert_eq!(line_text(&long).len(), config::MAX_LINE);
    }
}
