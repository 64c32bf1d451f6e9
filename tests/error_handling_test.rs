//! Tests for structured error handling in the autoping library
//!
//! These tests verify that the library returns structured errors that are
//! easy to handle programmatically.

use autoping::socket::utils::is_root;
use autoping::{send_pings, RangeSpec, Survey, SurveyConfig, SurveyError};
use std::net::Ipv4Addr;
use std::time::Duration;

#[test]
fn test_insufficient_permissions_error() {
    // Only meaningful when we cannot open raw sockets
    if is_root() {
        return;
    }

    match autoping::survey::echo_once(Ipv4Addr::LOCALHOST) {
        Err(SurveyError::InsufficientPermissions {
            required,
            suggestion,
        }) => {
            assert!(required.contains("root") || required.contains("CAP_NET_RAW"));
            assert!(!suggestion.is_empty());
            println!("Got expected structured error:");
            println!("  Required: {}", required);
            println!("  Suggestion: {}", suggestion);
        }
        Err(SurveyError::SocketError(e)) => {
            // Some sandboxes refuse raw sockets with an unrelated errno
            println!("Socket refused for another reason: {}", e);
        }
        Err(e) => panic!("Expected InsufficientPermissions error, got: {:?}", e),
        Ok(_) => {
            // Unprivileged raw ICMP is allowed on this host
        }
    }
}

#[test]
fn test_invalid_range_reported_before_socket() {
    // Validation runs first, so this fails the same way with or without root
    let specs = [RangeSpec::new(
        Ipv4Addr::new(192, 0, 2, 200),
        Ipv4Addr::new(192, 0, 2, 100),
    )];

    match send_pings(&specs) {
        Err(SurveyError::InvalidRange { start, end }) => {
            assert_eq!(start, Ipv4Addr::new(192, 0, 2, 200));
            assert_eq!(end, Ipv4Addr::new(192, 0, 2, 100));
        }
        other => panic!("Expected InvalidRange error, got: {:?}", other),
    }
}

#[test]
fn test_empty_config_error() {
    let err = SurveyConfig::builder().build().unwrap_err();
    assert!(err.contains("range"));
}

#[tokio::test]
async fn test_survey_rejects_bad_config_before_network() {
    let config = SurveyConfig {
        poll_interval: Duration::ZERO,
        ranges: vec!["10.0.0.1".parse().unwrap()],
        ..SurveyConfig::default()
    };

    let result = Survey::new(config).run_until(std::future::pending()).await;
    assert!(matches!(result, Err(SurveyError::ConfigError(_))));
}

#[test]
fn test_error_messages_are_descriptive() {
    let err = SurveyError::ParseError {
        line: 7,
        message: "bad octet".to_string(),
    };
    assert_eq!(err.to_string(), "Line 7: bad octet");

    let err = "300.1.1.1".parse::<RangeSpec>().unwrap_err();
    assert!(matches!(err, SurveyError::InvalidAddress(_)));
}
