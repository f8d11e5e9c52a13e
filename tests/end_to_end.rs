//! The full pipeline: decode, enrich, render, verify.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures::{pin_mut, StreamExt};
use tracepipe::containers::{
    fake_watcher::FakeWatcher, metadata_state, reflector::Reflector, ContainerMetadata,
    LifecycleEvent, PodMetadata,
};
use tracepipe::formatters::json::JsonFormatter;
use tracepipe::sources::mount::{self, MountOp, RawMountEvent};
use tracepipe::testing::{
    expect_entries_to_match, normalize_common_data, normalize_field, normalize_int,
    normalize_string, NORMALIZED_INT, NORMALIZED_STR,
};
use tracepipe::transforms::Transform;
use tracepipe::{transforms::enrich, Record, Value};

const MOUNT_NS_ID: u64 = 4026531840;
const ENOENT: i32 = 2;

fn test_container() -> ContainerMetadata {
    ContainerMetadata {
        id: "0123456789abcdef".to_owned(),
        name: "test-trace-mount".to_owned(),
        image: "docker.io/library/busybox:latest".to_owned(),
        mount_ns_id: MOUNT_NS_ID,
        started_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        pod: Some(PodMetadata {
            namespace: "test-trace-mount-ns".to_owned(),
            pod_name: "test-trace-mount-pod".to_owned(),
            owner: "job/test-trace-mount-5f6d8".to_owned(),
        }),
    }
}

fn mount_event() -> RawMountEvent {
    let mut comm = [0u8; 16];
    comm[..5].copy_from_slice(b"mount");
    RawMountEvent {
        op: MountOp::Mount,
        pid: 1234,
        tid: 1234,
        mount_ns_id: MOUNT_NS_ID,
        timestamp: 987_654_321,
        delta: 55_000,
        flags: 0,
        ret: -ENOENT,
        comm,
        fs: "ext4".to_owned(),
        src: "/mnt".to_owned(),
        dest: "/mnt".to_owned(),
        data: String::new(),
    }
}

fn normalize(record: &mut Record) {
    normalize_common_data(record);
    for field in ["timestamp", "delta", "pid", "tid", "mount_ns_id"] {
        normalize_field(record, field, normalize_int);
    }
    normalize_field(record, "fs", normalize_string);
}

fn expected_entry() -> Record {
    let mut record = Record::new();
    record.insert(
        "runtime",
        Value::map([
            ("container_name", Value::from("test-trace-mount")),
            (
                "container_image",
                Value::from("docker.io/library/busybox:latest"),
            ),
            ("container_id", NORMALIZED_STR),
        ]),
    );
    record.insert(
        "k8s",
        Value::map([
            ("namespace", Value::from("test-trace-mount-ns")),
            ("pod_name", Value::from("test-trace-mount-pod")),
            ("owner", NORMALIZED_STR),
        ]),
    );
    record.insert("comm", "mount");
    record.insert("op_str", "MOUNT");
    record.insert("src", "/mnt");
    record.insert("dest", "/mnt");
    record.insert("ret", i64::from(-ENOENT));
    record.insert("data", "");
    record.insert("timestamp", NORMALIZED_INT);
    record.insert("delta", NORMALIZED_INT);
    record.insert("pid", NORMALIZED_INT);
    record.insert("tid", NORMALIZED_INT);
    record.insert("mount_ns_id", NORMALIZED_INT);
    record.insert("fs", NORMALIZED_STR);
    record
}

#[tokio::test]
async fn pipeline_renders_and_verifies() {
    // Container discovery: reflect one lifecycle event into shared state.
    let (reader, writer) = metadata_state();
    let events = vec![Ok(LifecycleEvent::Added(test_container()))];
    let mut reflector = Reflector::new(
        FakeWatcher::new(events.into_iter()),
        writer,
        Duration::from_secs(1),
    );
    {
        let stream = reflector.run();
        pin_mut!(stream);
        stream
            .next()
            .await
            .expect("one applied event")
            .expect("fake watcher cannot fail");
    }

    // Production path: decode, enrich, render.
    let mut enricher = enrich::build(true, reader);
    let record = enricher
        .transform(mount_event().into_record())
        .expect("the enricher never drops records");

    let formatter = JsonFormatter::with_defaults(mount::schema());
    let output = formatter.render(&[record]).expect("render succeeds");

    // Verification path: parse, normalize, match.
    expect_entries_to_match(&mount::schema(), &output, normalize, &[expected_entry()])
        .expect("captured output matches the expected entry");

    // A wrong literal field must be reported with its diff.
    let mut wrong = expected_entry();
    wrong.insert("comm", "open");
    let err = expect_entries_to_match(&mount::schema(), &output, normalize, &[wrong])
        .expect_err("mismatch is detected");
    assert!(err.to_string().contains(r#"comm: "mount" (want "open")"#));
}

#[test]
fn explicit_field_selection_end_to_end() {
    use tracepipe::formatters::json::{with_fields, with_pretty};

    let record = mount_event().into_record();
    let formatter = JsonFormatter::new(mount::schema(), [with_fields(["comm", "ret"])]);
    let output = formatter.render(&[record.clone()]).expect("render succeeds");
    assert_eq!(output, r#"{"comm":"mount","ret":-2}"#);

    // Pretty output parses back and still verifies.
    let formatter = JsonFormatter::new(
        mount::schema(),
        [with_fields(["comm", "ret"]), with_pretty(true, "    ")],
    );
    let output = formatter.render(&[record]).expect("render succeeds");

    let mut want = Record::new();
    want.insert("comm", "mount");
    want.insert("ret", NORMALIZED_INT);
    expect_entries_to_match(
        &mount::schema(),
        &output,
        |record| normalize_field(record, "ret", normalize_int),
        &[want],
    )
    .expect("pretty output verifies");
}
