//! Host window and notification hooks for typing sessions.
//!
//! The "window" is the console hosting the process: minimizing it hands
//! focus back to the target application during the countdown.

use tracing::debug;

use autotyper::session::SessionShell;

use crate::feedback::FeedbackPlayer;

/// Console window control plus completion sound
pub struct DesktopShell {
    /// Completion sound
    feedback: FeedbackPlayer,
}

impl DesktopShell {
    /// Create the shell
    pub const fn new(feedback: FeedbackPlayer) -> Self {
        Self { feedback }
    }

    /// Show the console window with `cmd`
    #[cfg(windows)]
    fn show_console(cmd: windows::Win32::UI::WindowsAndMessaging::SHOW_WINDOW_CMD) {
        use windows::Win32::System::Console::GetConsoleWindow;
        use windows::Win32::UI::WindowsAndMessaging::ShowWindow;

        // SAFETY: GetConsoleWindow has no preconditions and returns a null
        // handle when the process has no console.
        let hwnd = unsafe { GetConsoleWindow() };
        if hwnd.0.is_null() {
            debug!("No console window to show or hide");
            return;
        }
        // SAFETY: hwnd was just returned by GetConsoleWindow and is non-null.
        let _ = unsafe { ShowWindow(hwnd, cmd) };
    }
}

impl SessionShell for DesktopShell {
    fn minimize(&self) {
        #[cfg(windows)]
        Self::show_console(windows::Win32::UI::WindowsAndMessaging::SW_MINIMIZE);
        #[cfg(not(windows))]
        debug!("Window minimize is not supported on this platform");
    }

    fn restore(&self) {
        #[cfg(windows)]
        Self::show_console(windows::Win32::UI::WindowsAndMessaging::SW_RESTORE);
        #[cfg(not(windows))]
        debug!("Window restore is not supported on this platform");
    }

    fn notify_complete(&self) {
        self.feedback.notify();
    }
}
