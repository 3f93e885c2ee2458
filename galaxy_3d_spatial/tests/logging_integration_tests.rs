//! Integration tests for the spatial index logging system
//!
//! These tests install a capturing logger and check both direct logging
//! and the warnings the quad tree emits on caller misuse.
//!
//! Run with: cargo test --test logging_integration_tests

use galaxy_3d_spatial::galaxy3d::Diagnostics;
use galaxy_3d_spatial::galaxy3d::log::{Logger, LogEntry, LogSeverity};
use galaxy_3d_spatial::galaxy3d::shapes::BoundingShape;
use galaxy_3d_spatial::galaxy3d::spatial::QuadTree;
use galaxy_3d_spatial::glam::Vec3;
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn warnings(entries: &Arc<Mutex<Vec<LogEntry>>>) -> Vec<LogEntry> {
    entries
        .lock()
        .unwrap()
        .iter()
        .filter(|entry| entry.severity == LogSeverity::Warn)
        .cloned()
        .collect()
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Diagnostics::set_logger(test_logger);

    Diagnostics::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Diagnostics::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());
    Diagnostics::log(LogSeverity::Error, "test::module", "Test error message".to_string());

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 3);
        assert_eq!(captured[0].severity, LogSeverity::Info);
        assert_eq!(captured[0].message, "Test info message");
        assert_eq!(captured[1].severity, LogSeverity::Warn);
        assert_eq!(captured[2].severity, LogSeverity::Error);
        assert!(captured.iter().all(|entry| entry.source == "test::module"));
    }

    Diagnostics::reset_logger();
}

#[test]
#[serial]
fn test_integration_error_logging_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Diagnostics::set_logger(test_logger);

    Diagnostics::log_detailed(
        LogSeverity::Error,
        "test::error",
        "Critical error occurred".to_string(),
        "test_file.rs",
        42,
    );

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].file, Some("test_file.rs"));
        assert_eq!(captured[0].line, Some(42));
    }

    Diagnostics::reset_logger();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    Diagnostics::set_logger(test_logger);

    Diagnostics::log(LogSeverity::Info, "test", "Message 1".to_string());
    assert_eq!(entries.lock().unwrap().len(), 1);

    Diagnostics::reset_logger();

    // Goes to the default logger, not captured
    Diagnostics::log(LogSeverity::Info, "test", "Message 2".to_string());
    assert_eq!(entries.lock().unwrap().len(), 1);
}

// ============================================================================
// QUAD TREE WARNINGS
// ============================================================================

#[test]
#[serial]
fn test_integration_unknown_shape_removal_warns() {
    let (test_logger, entries) = TestLogger::new();
    Diagnostics::set_logger(test_logger);

    let mut tree = QuadTree::new();
    let key = tree.insert(BoundingShape::sphere(Vec3::ZERO, 1.0));
    tree.update(0.016);
    assert!(tree.remove(key).is_some());
    assert!(warnings(&entries).is_empty());

    assert!(tree.remove(key).is_none());

    let warned = warnings(&entries);
    assert_eq!(warned.len(), 1);
    assert_eq!(warned[0].source, "galaxy3d::QuadTree");
    assert!(warned[0].message.contains("not found"));
    assert_eq!(warned[0].file, None);

    Diagnostics::reset_logger();
}

#[test]
#[serial]
fn test_integration_unknown_camera_removal_warns() {
    let (test_logger, entries) = TestLogger::new();
    Diagnostics::set_logger(test_logger);

    let mut tree = QuadTree::new();
    let camera = tree.add_camera(BoundingShape::sphere(Vec3::ZERO, 1.0));
    assert!(tree.remove_camera(camera).is_some());
    assert!(tree.remove_camera(camera).is_none());

    let warned = warnings(&entries);
    assert_eq!(warned.len(), 1);
    assert_eq!(warned[0].source, "galaxy3d::QuadTree");

    Diagnostics::reset_logger();
}

#[test]
#[serial]
fn test_integration_structural_changes_are_traced() {
    let (test_logger, entries) = TestLogger::new();
    Diagnostics::set_logger(test_logger);

    let mut tree = QuadTree::new();
    for i in 0..12 {
        tree.insert(BoundingShape::sphere(Vec3::new(i as f32, 0.0, (i % 4) as f32), 0.3));
    }
    tree.update(0.016);

    {
        let captured = entries.lock().unwrap();
        let traces: Vec<&LogEntry> = captured
            .iter()
            .filter(|entry| entry.severity == LogSeverity::Trace)
            .collect();
        assert!(traces.iter().any(|entry| entry.message.starts_with("Rebuilding")));
        assert!(traces.iter().any(|entry| entry.message.starts_with("Subdivided")));
        assert!(captured.iter().all(|entry| entry.severity < LogSeverity::Warn));
    }

    Diagnostics::reset_logger();
}
