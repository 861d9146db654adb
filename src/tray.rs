//! System tray icon with session controls

use anyhow::{Context, Result};
use tracing::info;
use tray_icon::{
    Icon, TrayIcon, TrayIconBuilder,
    menu::{Menu, MenuEvent, MenuItem},
};

/// What the tray shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayState {
    /// Counting down before typing
    Countdown(u32),
    /// Typing, with percent complete
    Typing(u8),
    /// Holding on a pause
    Paused,
    /// Session over
    Finished,
}

/// Commands chosen from the tray menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    /// Pause or resume, depending on the current state
    TogglePause,
    /// Stop the session
    Stop,
    /// Stop and exit
    Quit,
}

/// System tray manager
pub struct TrayManager {
    /// Tray icon
    tray: TrayIcon,
    /// Pause / resume menu item
    pause_item: MenuItem,
    /// Stop menu item
    stop_item: MenuItem,
    /// Quit menu item
    quit_item: MenuItem,
    /// Last state shown
    state: Option<TrayState>,
}

impl TrayManager {
    /// Create new tray manager
    pub fn new(stop_label: &str) -> Result<Self> {
        let pause_item = MenuItem::new("Pause", true, None);
        let stop_item = MenuItem::new(format!("Stop ({stop_label})"), true, None);
        let quit_item = MenuItem::new("Quit", true, None);
        let menu = Menu::new();
        menu.append(&pause_item).context("Failed to add pause item")?;
        menu.append(&stop_item).context("Failed to add stop item")?;
        menu.append(&quit_item).context("Failed to add quit item")?;

        let mut builder = TrayIconBuilder::new()
            .with_tooltip("Autotyper")
            .with_menu(Box::new(menu));

        // Icon is optional; the platform default is used without it
        if let Some(icon) = Self::load_icon("./assets/icons/keyboard.ico") {
            builder = builder.with_icon(icon);
        }

        let tray = builder.build().context("Failed to create tray icon")?;

        info!("System tray icon created");

        Ok(Self {
            tray,
            pause_item,
            stop_item,
            quit_item,
            state: None,
        })
    }

    /// Load icon from file
    fn load_icon(path: &str) -> Option<Icon> {
        #[cfg(windows)]
        match Icon::from_path(path, None) {
            Ok(icon) => {
                info!("Loaded icon: {}", path);
                Some(icon)
            }
            Err(e) => {
                info!("Could not load icon {}: {} (using default)", path, e);
                None
            }
        }
        // `Icon::from_path` is Windows only; the tray is Windows only too
        #[cfg(not(windows))]
        {
            let _ = path;
            None
        }
    }

    /// Update tooltip and menu for `state`
    pub fn set_state(&mut self, state: TrayState) -> Result<()> {
        if self.state == Some(state) {
            return Ok(());
        }

        let tooltip = match state {
            TrayState::Countdown(secs) => format!("Autotyper - starting in {secs}s"),
            TrayState::Typing(percent) => format!("Autotyper - typing {percent}%"),
            TrayState::Paused => "Autotyper - paused".to_owned(),
            TrayState::Finished => "Autotyper - finished".to_owned(),
        };

        self.tray
            .set_tooltip(Some(tooltip))
            .context("Failed to set tooltip")?;

        self.pause_item.set_text(if state == TrayState::Paused {
            "Resume"
        } else {
            "Pause"
        });
        let active = state != TrayState::Finished;
        self.pause_item.set_enabled(active);
        self.stop_item.set_enabled(active);

        self.state = Some(state);
        Ok(())
    }

    /// Next menu command, if one was clicked
    pub fn poll_command(&self) -> Option<TrayCommand> {
        let event = MenuEvent::receiver().try_recv().ok()?;
        if event.id == self.pause_item.id() {
            Some(TrayCommand::TogglePause)
        } else if event.id == self.stop_item.id() {
            Some(TrayCommand::Stop)
        } else if event.id == self.quit_item.id() {
            Some(TrayCommand::Quit)
        } else {
            None
        }
    }
}
