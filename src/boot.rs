//! Process bootstrap for running as PID 1
//!
//! When the kernel starts us as init there is nobody else to set up the
//! basics, so this module:
//! 1. Becomes session leader
//! 2. Points fds 0-2 at `/dev/console`
//! 3. Mounts /proc, /sys, /dev and /run
//! 4. Installs a SIGCHLD handler so orphans can be reaped from the prompt loop
//!
//! It also owns the power-off and reboot syscalls.

use std::ffi::CString;
use std::fs::{DirBuilder, OpenOptions};
use std::io;
use std::mem::MaybeUninit;
use std::os::fd::IntoRawFd;
use std::os::unix::fs::DirBuilderExt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Console device handed to the shell
pub const CONSOLE_DEVICE: &str = "/dev/console";

/// Pseudo filesystems mounted at boot: (source, target, type, data)
const BASIC_MOUNTS: [(&str, &str, &str, &str); 4] = [
    ("proc", "/proc", "proc", ""),
    ("sysfs", "/sys", "sysfs", ""),
    ("devtmpfs", "/dev", "devtmpfs", ""),
    ("tmpfs", "/run", "tmpfs", "mode=0755"),
];

/// Set from the SIGCHLD handler, cleared by `reap_children`
static CHILD_EXITED: AtomicBool = AtomicBool::new(false);

/// True when running as the init process
pub fn is_init() -> bool {
    std::process::id() == 1
}

// ============================================================================
// Session and Console
// ============================================================================

pub fn become_session_leader() {
    // SAFETY: setsid has no memory-safety preconditions
    if unsafe { libc::setsid() } < 0 {
        log::debug!("setsid: {}", io::Error::last_os_error());
    }
}

/// Reopen stdin, stdout and stderr on the console device
pub fn attach_console() -> io::Result<()> {
    let console = OpenOptions::new()
        .read(true)
        .write(true)
        .open(CONSOLE_DEVICE)?;
    let fd = console.into_raw_fd();

    for target in 0..=2 {
        // SAFETY: both descriptors are open; dup2 replaces `target` atomically
        if unsafe { libc::dup2(fd, target) } < 0 {
            let err = io::Error::last_os_error();
            log::warn!("dup2({}, {}): {}", fd, target, err);
        }
    }
    if fd > 2 {
        // SAFETY: `fd` came from into_raw_fd and is not used again
        unsafe { libc::close(fd) };
    }
    Ok(())
}

// ============================================================================
// Mounts
// ============================================================================

fn mount(source: &str, target: &str, fstype: &str, data: &str) -> io::Result<()> {
    let to_c = |s: &str| CString::new(s).map_err(io::Error::other);
    let (source, target, fstype, data) = (to_c(source)?, to_c(target)?, to_c(fstype)?, to_c(data)?);

    // SAFETY: all pointers are valid NUL-terminated strings for the call
    let rc = unsafe {
        libc::mount(
            source.as_ptr(),
            target.as_ptr(),
            fstype.as_ptr(),
            0,
            data.as_ptr().cast(),
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Create the mount points and mount the pseudo filesystems.
/// Failures are logged and skipped.
pub fn mount_basic_fs() {
    for (source, target, fstype, data) in BASIC_MOUNTS {
        if let Err(e) = DirBuilder::new().mode(0o555).create(target) {
            if e.kind() != io::ErrorKind::AlreadyExists {
                log::warn!("mkdir {}: {}", target, e);
            }
        }
        match mount(source, target, fstype, data) {
            Ok(()) => log::info!("mounted {} on {}", fstype, target),
            Err(e) if e.raw_os_error() == Some(libc::EBUSY) => {
                log::debug!("{} already mounted", target)
            }
            Err(e) => log::warn!("mount {} on {}: {}", fstype, target, e),
        }
    }
}

// ============================================================================
// Child Reaping
// ============================================================================

extern "C" fn on_sigchld(_signal: libc::c_int) {
    CHILD_EXITED.store(true, Ordering::SeqCst);
}

/// Install the SIGCHLD handler (`SA_RESTART | SA_NOCLDSTOP`)
pub fn install_sigchld_handler() -> io::Result<()> {
    // SAFETY: an all-zero sigaction is valid; the fields we need are set below
    let mut action: libc::sigaction = unsafe { MaybeUninit::zeroed().assume_init() };
    action.sa_sigaction = on_sigchld as extern "C" fn(libc::c_int) as libc::sighandler_t;
    action.sa_flags = libc::SA_RESTART | libc::SA_NOCLDSTOP;

    // SAFETY: `action` is initialized and outlives both calls
    unsafe {
        libc::sigemptyset(&mut action.sa_mask);
        if libc::sigaction(libc::SIGCHLD, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Collect every exited child if SIGCHLD fired; returns how many
pub fn reap_children() -> usize {
    if !CHILD_EXITED.swap(false, Ordering::SeqCst) {
        return 0;
    }

    let mut reaped = 0;
    loop {
        let mut status = 0;
        // SAFETY: `status` is a valid out-pointer
        let pid = unsafe { libc::waitpid(-1, &mut status, libc::WNOHANG) };
        if pid <= 0 {
            break;
        }
        log::debug!("reaped pid {} (status {:#x})", pid, status);
        reaped += 1;
    }
    reaped
}

// ============================================================================
// Power
// ============================================================================

fn reboot_with(cmd: libc::c_int) -> io::Error {
    // SAFETY: sync and reboot take no pointers
    unsafe {
        libc::sync();
        libc::reboot(cmd);
    }
    io::Error::last_os_error()
}

/// Flush filesystems and power off. Returns only on failure.
pub fn power_off() -> io::Error {
    log::info!("powering off");
    reboot_with(libc::RB_POWER_OFF)
}

/// Flush filesystems and restart. Returns only on failure.
pub fn reboot() -> io::Error {
    log::info!("rebooting");
    reboot_with(libc::RB_AUTOBOOT)
}
