//! Terminal-side collaborators for the session engine.

use std::io::Write;

use notify_rust::Notification;
use tomatotock_core::storage::Config;
use tomatotock_core::{
    Database, NotificationRequest, NotificationSink, NullSink, PresentationSink, SinkError,
    Sinks, SoundCue, SoundSink, StateBroadcast,
};
use tomatotock_core::sinks::SinkResult;

use crate::locale::{format_time, Locale};

/// One line per state change. A paused session shows the interrupted phase
/// with a paused suffix rather than the idle label.
pub struct ConsolePresentation {
    locale: Locale,
}

impl ConsolePresentation {
    fn label(&self, state: &StateBroadcast) -> String {
        match state.paused_in {
            Some(phase) => format!(
                "{}{}",
                self.locale.text(&format!("state_{phase}")),
                self.locale.text("state_paused")
            ),
            None => self.locale.text(&format!("state_{}", state.phase)),
        }
    }
}

impl PresentationSink for ConsolePresentation {
    fn emit_state(&mut self, state: StateBroadcast) -> SinkResult {
        let label = self.label(&state);
        let mut out = std::io::stdout().lock();
        writeln!(out, "{label:<12} {}", format_time(state.remaining_seconds))
            .map_err(|e| SinkError::failed("presentation", e))
    }
}

/// Rings the terminal bell for start/complete cues. Audio playback is left
/// to a desktop shell; custom sound files are only reported.
pub struct TerminalBell {
    custom_start: String,
    custom_tick: String,
    custom_complete: String,
}

impl TerminalBell {
    pub fn from_config(config: &Config) -> Self {
        Self {
            custom_start: config.sounds.custom_start.clone(),
            custom_tick: config.sounds.custom_tick.clone(),
            custom_complete: config.sounds.custom_complete.clone(),
        }
    }

    fn custom_path(&self, cue: SoundCue) -> &str {
        match cue {
            SoundCue::Start => &self.custom_start,
            SoundCue::Tick => &self.custom_tick,
            SoundCue::Complete => &self.custom_complete,
        }
    }
}

impl SoundSink for TerminalBell {
    fn play(&mut self, cue: SoundCue, looped: bool) -> SinkResult {
        let custom = self.custom_path(cue);
        tracing::debug!(?cue, looped, custom, "sound cue");
        if cue == SoundCue::Tick {
            return Ok(());
        }
        let mut out = std::io::stdout();
        out.write_all(b"\x07")
            .and_then(|_| out.flush())
            .map_err(|e| SinkError::failed("sound", e))
    }

    fn stop(&mut self) -> SinkResult {
        tracing::debug!("sound stopped");
        Ok(())
    }
}

/// Desktop notification with a console echo.
pub struct DesktopNotifier {
    locale: Locale,
    desktop: bool,
}

impl NotificationSink for DesktopNotifier {
    fn notify(&mut self, request: &NotificationRequest) -> SinkResult {
        let title = self.locale.translate(&request.title_key, &request.params);
        let body = self.locale.translate(&request.body_key, &request.params);
        let echoed = writeln!(std::io::stdout().lock(), "** {title}: {body}")
            .map_err(|e| SinkError::failed("notification", e));
        if !self.desktop {
            return echoed;
        }
        Notification::new()
            .summary(&title)
            .body(&body)
            .appname("Tomatotock")
            .show()
            .map_err(|e| SinkError::failed("notification", e))?;
        echoed
    }
}

pub fn build(config: &Config, desktop_notifications: bool) -> Sinks {
    let stats: Box<dyn tomatotock_core::StatsSink + Send> = if config.general.enable_stats {
        match Database::open() {
            Ok(db) => Box::new(db),
            Err(e) => {
                tracing::warn!(error = %e, "statistics disabled for this session");
                Box::new(NullSink)
            }
        }
    } else {
        Box::new(NullSink)
    };

    let locale = Locale::from_code(&config.general.language);
    Sinks {
        presentation: Box::new(ConsolePresentation { locale }),
        sound: Box::new(TerminalBell::from_config(config)),
        notifications: Box::new(DesktopNotifier {
            locale,
            desktop: desktop_notifications,
        }),
        stats,
    }
}
