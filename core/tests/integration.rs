//! Full lifecycle test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every client
//! operation over real HTTP through `BlockingClient`. Validates that request
//! building, authentication, echo verification, and response parsing work
//! end-to-end with the actual server.

use olog_client::{
    ApiError, Attribute, BlockingClient, Logbook, LogsQuery, NewAttachment, Property, Tag,
};

/// Seed a log entry over raw HTTP and return the id the server assigned.
///
/// Log creation belongs to other tooling in production, so the client has no
/// wrapper for it; tests hit the endpoint directly.
fn seed_log(base: &str, body: &str) -> i64 {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let mut response = agent
        .put(&format!("{base}/logs"))
        .header("content-type", "application/json")
        .header("authorization", "Basic dGVzdDp0ZXN0")
        .send(body.as_bytes())
        .expect("HTTP transport error");
    assert_eq!(response.status().as_u16(), 200);
    let text = response.body_mut().read_to_string().unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    value["id"].as_i64().unwrap()
}

#[test]
fn full_api_lifecycle() {
    // Step 1: start mock server on a random port.
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    let base = format!("http://{addr}");
    let client = BlockingClient::new(&base, "olog-logs", "secret");

    // Step 2: all collections start empty.
    assert!(client.get_logbooks().unwrap().is_empty());
    assert!(client.get_tags().unwrap().is_empty());
    assert!(client.get_properties().unwrap().is_empty());

    // Step 3: bulk puts.
    client
        .put_logbooks(&[Logbook {
            name: "TEST".to_string(),
            owner: Some("olog-logs".to_string()),
            state: "Active".to_string(),
        }])
        .unwrap();
    client
        .put_tags(&[
            Tag {
                name: "Fault".to_string(),
                state: "Active".to_string(),
            },
            Tag {
                name: "Quench".to_string(),
                state: "Active".to_string(),
            },
        ])
        .unwrap();
    assert_eq!(client.get_logbooks().unwrap().len(), 1);
    assert_eq!(client.get_tags().unwrap().len(), 2);

    // Step 4: single puts come back echo-verified.
    let operations = Logbook {
        name: "Operations".to_string(),
        owner: Some("olog-logs".to_string()),
        state: "Active".to_string(),
    };
    let echoed = client.put_logbook(&operations).unwrap();
    assert_eq!(echoed, operations);

    let fault = Tag {
        name: "Fault".to_string(),
        state: "Active".to_string(),
    };
    assert_eq!(client.put_tag(&fault).unwrap(), fault);

    // Attributes are deliberately out of order; the server stores them
    // sorted and the echo check must not trip on that.
    let ticket = Property {
        name: "Ticket".to_string(),
        owner: Some("olog-logs".to_string()),
        state: "Active".to_string(),
        attributes: vec![
            Attribute {
                name: "url".to_string(),
                value: None,
                state: "Active".to_string(),
            },
            Attribute {
                name: "id".to_string(),
                value: None,
                state: "Active".to_string(),
            },
        ],
    };
    let echoed = client.put_property(&ticket).unwrap();
    assert_eq!(echoed.attributes[0].name, "id");
    assert_eq!(echoed.attributes[1].name, "url");

    // Step 5: fetch by name, including one name that needs percent-encoding
    // on the wire.
    assert_eq!(client.get_logbook("Operations").unwrap(), operations);
    assert_eq!(client.get_tag("Fault").unwrap(), fault);
    assert_eq!(client.get_property("Ticket").unwrap().name, "Ticket");

    let shift = Logbook {
        name: "Shift Summaries".to_string(),
        owner: Some("olog-logs".to_string()),
        state: "Active".to_string(),
    };
    client.put_logbook(&shift).unwrap();
    assert_eq!(client.get_logbook("Shift Summaries").unwrap(), shift);

    // Step 6: missing names are NotFound.
    let err = client.get_logbook("DoesNotExist").unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 7: a foreign owner fails locally, before any request is sent.
    let foreign = Logbook {
        name: "Intrusion".to_string(),
        owner: Some("someone-else".to_string()),
        state: "Active".to_string(),
    };
    let err = client.put_logbook(&foreign).unwrap_err();
    assert!(matches!(err, ApiError::OwnerMismatch { .. }));
    let err = client.get_logbook("Intrusion").unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 8: seed two log entries directly.
    let beam_log = seed_log(
        &base,
        r#"{
            "owner": "olog-logs",
            "description": "beam dumped during injection",
            "createTime": "2021-03-04 05:06:07.891",
            "logbooks": [{"name": "Operations", "state": "Active"}],
            "tags": [{"name": "Fault", "state": "Active"}]
        }"#,
    );
    let quench_log = seed_log(
        &base,
        r#"{
            "owner": "physics",
            "description": "quench recovery complete",
            "createTime": "2021-03-05 10:00:00.000",
            "logbooks": [{"name": "TEST", "state": "Active"}]
        }"#,
    );

    // Step 9: fetch single entries by id.
    let entry = client.get_log(beam_log).unwrap();
    assert_eq!(entry.description, "beam dumped during injection");
    assert_eq!(entry.create_time.as_deref(), Some("2021-03-04 05:06:07.891"));
    assert_eq!(entry.logbooks[0].name, "Operations");

    let err = client.get_log(9999).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 10: search.
    let all = client.get_logs(&LogsQuery::default()).unwrap();
    assert_eq!(all.len(), 2);

    let query = LogsQuery {
        logbooks: Some("Operations".to_string()),
        ..LogsQuery::default()
    };
    let hits = client.get_logs(&query).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, beam_log);

    // A date-only start is normalized to canonical form before it goes on
    // the wire; the window below the second entry excludes it.
    let query = LogsQuery {
        start: Some("2021-03-04".into()),
        end: Some("2021-03-04 23:59:59.999".into()),
        ..LogsQuery::default()
    };
    let hits = client.get_logs(&query).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, beam_log);

    let query = LogsQuery {
        start: Some("2050-01-01".into()),
        ..LogsQuery::default()
    };
    assert!(client.get_logs(&query).unwrap().is_empty());

    // Step 11: attachment upload and download roundtrip.
    let data = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x00, 0xff];
    let attachment = NewAttachment {
        filename: "beam profile.png".to_string(),
        data: data.clone(),
        metadata_description: Some("injection current".to_string()),
    };
    client.post_attachment(beam_log, &attachment).unwrap();
    let downloaded = client.get_attachment(beam_log, "beam profile.png").unwrap();
    assert_eq!(downloaded, data);

    let err = client.get_attachment(beam_log, "missing.txt").unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    let err = client.get_attachment(quench_log, "beam profile.png").unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}
