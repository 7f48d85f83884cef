use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use crate::{debug, fatal, info, warn};

use super::*;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_macro() {
    let basic =
        BasicLogger::new(false, super::Level::Info, false, Box::new(io::stdout())).into_box();

    let tracker = super::Tracker::new("exec-1", "step-1");
    let option_tracker = Some(&tracker);
    fatal!(basic, "test");
    fatal!(basic, { tracker = tracker }, "test");
    fatal!(basic, { option_tracker = option_tracker }, "test");
    fatal!(basic, { option_tracker = None }, "test {}", 1);
}

#[test]
fn test_level_filter_and_tags() {
    let buffer = SharedBuffer::default();
    let root = Arc::new(
        BasicLogger::new(true, super::Level::Info, false, Box::new(buffer.clone())).into_box(),
    );
    let logger = TagLogger::new(root, "plugin/approve".to_owned()).into_box();
    let tracker = super::Tracker::new("exec-1", "step-1");

    debug!(logger, "hidden");
    info!(logger, { tracker = tracker }, "visible {}", 42);
    warn!(logger, "second");

    let out = buffer.contents();
    assert!(!out.contains("hidden"));
    assert!(out.contains("[Info] [exec-1/step-1] [plugin/approve] visible 42\n"));
    assert!(out.contains("[Warn] [plugin/approve] second\n"));
}

#[test]
fn test_level_from_str() {
    assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warn);
    assert_eq!("".parse::<Level>().unwrap(), Level::Info);
    assert!("verbose".parse::<Level>().is_err());
}
