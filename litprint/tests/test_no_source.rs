use litprint::{
    lit_with, Debugger, DebuggerConfig, NoSourceLocator, OutputSink, NO_SOURCE_WARNING,
};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_missing_source_warns_once_and_drops_labels() {
    let logs = SharedBuf::default();
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .target(env_logger::Target::Pipe(Box::new(logs.clone())))
        .try_init()
        .unwrap();

    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink_lines = Arc::clone(&lines);
    let config = DebuggerConfig {
        output: OutputSink::function(move |text| {
            sink_lines.lock().unwrap().push(text.to_string());
        }),
        ..DebuggerConfig::default()
    };
    let dbg = Debugger::new(config).with_locator(Arc::new(NoSourceLocator));

    let x = 1;
    let name = "n";
    let pair = lit_with!(dbg; x, name);
    assert_eq!(pair, (1, "n"));
    assert_eq!(*lines.lock().unwrap(), vec!["LIT| 1, 'n'"]);

    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert_eq!(text.matches(NO_SOURCE_WARNING).count(), 1, "{}", text);
    assert!(text.contains("source lookup disabled"));
}
