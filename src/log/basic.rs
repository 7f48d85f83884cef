use std::{
    io::Write,
    sync::{Arc, Mutex},
};

pub(crate) struct BasicLogger {
    disable_timestamp: bool,
    level: super::Level,
    color_enabled: bool,
    output: Arc<Mutex<Box<dyn Write + Send + Sync>>>,
}

impl BasicLogger {
    pub(crate) fn new(
        disable_timestamp: bool,
        level: super::Level,
        color_enabled: bool,
        output: Box<dyn Write + Send + Sync>,
    ) -> Self {
        Self {
            disable_timestamp,
            level,
            color_enabled,
            output: Arc::new(Mutex::new(output)),
        }
    }

    pub(crate) fn into_box(self) -> Box<dyn super::Logger> {
        Box::new(self)
    }

    fn format_line(
        &self,
        level: super::Level,
        tracker: Option<&super::Tracker>,
        message: std::fmt::Arguments<'_>,
    ) -> String {
        let mut s = String::new();
        if !self.disable_timestamp {
            s.push_str(&format!(
                "[{}] ",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            ));
        }
        if self.color_enabled {
            s.push_str(&format!("[{}] ", level.to_color_str()));
        } else {
            s.push_str(&format!("[{}] ", level.to_str()));
        }
        if let Some(tracker) = tracker {
            if self.color_enabled {
                s.push_str(&format!("[{}] ", tracker.to_color_str()));
            } else {
                s.push_str(&format!("[{}] ", tracker.to_str()));
            }
        }
        s.push_str(message.to_string().trim_end());
        s.push('\n');
        s
    }

    fn write_to_output(&self, s: &str) {
        if let Ok(mut output) = self.output.lock() {
            if output.write_all(s.as_bytes()).is_ok() {
                output.flush().ok();
            }
        }
    }
}

impl super::Logger for BasicLogger {
    fn enabled(&self, level: super::Level) -> bool {
        self.level <= level
    }

    fn color_enabled(&self) -> bool {
        self.color_enabled
    }

    fn log(&self, level: super::Level, message: std::fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let s = self.format_line(level, None, message);
        self.write_to_output(&s);
    }

    fn log_with_tracker(
        &self,
        level: super::Level,
        tracker: &super::Tracker,
        message: std::fmt::Arguments<'_>,
    ) {
        if !self.enabled(level) {
            return;
        }
        let s = self.format_line(level, Some(tracker), message);
        self.write_to_output(&s);
    }
}
