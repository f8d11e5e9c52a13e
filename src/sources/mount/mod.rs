//! The mount/umount syscall trace event.
//!
//! The kernel-data source delivers one materialized [`RawMountEvent`] per
//! observed syscall; this module turns it into a [`Record`] and owns the
//! event type's field schema.

use crate::event::Record;
use crate::schema::{EventSchema, FieldKind};

const EVENT_TYPE: &str = "mount";

/// The syscall the event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountOp {
    Mount,
    Umount,
}

impl MountOp {
    /// The wire spelling carried in the `op_str` field.
    pub fn as_str(self) -> &'static str {
        match self {
            MountOp::Mount => "MOUNT",
            MountOp::Umount => "UMOUNT",
        }
    }
}

/// One materialized mount-syscall event, as handed over by the kernel-data
/// source. String buffers sourced from fixed-width kernel fields are
/// NUL-padded.
#[derive(Debug, Clone)]
pub struct RawMountEvent {
    pub op: MountOp,
    pub pid: u32,
    pub tid: u32,
    pub mount_ns_id: u64,
    /// Nanoseconds since boot.
    pub timestamp: u64,
    /// Nanoseconds spent inside the syscall.
    pub delta: u64,
    /// Raw mount flags bitmask.
    pub flags: u64,
    /// Syscall return value, negative errno on failure.
    pub ret: i32,
    /// Task command name, NUL-padded.
    pub comm: [u8; 16],
    pub fs: String,
    pub src: String,
    pub dest: String,
    pub data: String,
}

impl RawMountEvent {
    /// Convert into a record carrying the event-specific fields. Identity
    /// blocks are attached later by the enrichment stage.
    pub fn into_record(self) -> Record {
        let mut record = Record::new();
        record.insert("timestamp", self.timestamp);
        record.insert("delta", self.delta);
        record.insert("pid", i64::from(self.pid));
        record.insert("tid", i64::from(self.tid));
        record.insert("mount_ns_id", self.mount_ns_id);
        record.insert("comm", trim_nul(&self.comm));
        record.insert("op_str", self.op.as_str());
        record.insert("ret", i64::from(self.ret));
        record.insert("fs", self.fs);
        record.insert("src", self.src);
        record.insert("dest", self.dest);
        record.insert("data", self.data);
        record.insert("flags", self.flags);
        record
    }
}

/// The ordered field schema for mount events.
///
/// The raw `flags` bitmask stays out of the default render set; its decoded
/// meaning travels in `op_str` and `data`.
pub fn schema() -> EventSchema {
    EventSchema::builder(EVENT_TYPE)
        .field("runtime", FieldKind::Nested)
        .field("k8s", FieldKind::Nested)
        .field("timestamp", FieldKind::Unsigned)
        .field("delta", FieldKind::Unsigned)
        .field("pid", FieldKind::Integer)
        .field("tid", FieldKind::Integer)
        .field("mount_ns_id", FieldKind::Unsigned)
        .field("comm", FieldKind::String)
        .field("op_str", FieldKind::String)
        .field("ret", FieldKind::Integer)
        .field("fs", FieldKind::String)
        .field("src", FieldKind::String)
        .field("dest", FieldKind::String)
        .field("data", FieldKind::String)
        .hidden_field("flags", FieldKind::Unsigned)
        .build()
}

fn trim_nul(buffer: &[u8]) -> String {
    let end = buffer
        .iter()
        .position(|byte| *byte == 0)
        .unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Value;

    fn sample() -> RawMountEvent {
        let mut comm = [0u8; 16];
        comm[..5].copy_from_slice(b"mount");
        RawMountEvent {
            op: MountOp::Mount,
            pid: 1234,
            tid: 1234,
            mount_ns_id: 4026531840,
            timestamp: 1_000_000_000,
            delta: 55_000,
            flags: 0,
            ret: -2,
            comm,
            fs: "ext4".to_owned(),
            src: "/mnt".to_owned(),
            dest: "/mnt".to_owned(),
            data: String::new(),
        }
    }

    #[test]
    fn decodes_into_record() {
        let record = sample().into_record();

        assert_eq!(record.get("comm"), Some(&Value::from("mount")));
        assert_eq!(record.get("op_str"), Some(&Value::from("MOUNT")));
        assert_eq!(record.get("ret"), Some(&Value::Integer(-2)));
        assert_eq!(record.get("mount_ns_id"), Some(&Value::Unsigned(4026531840)));
        assert_eq!(record.get("data"), Some(&Value::from("")));
    }

    #[test]
    fn comm_is_trimmed_at_first_nul() {
        let mut event = sample();
        event.comm = *b"mount\0garbage\0\0\0";
        let record = event.into_record();
        assert_eq!(record.get("comm"), Some(&Value::from("mount")));
    }

    #[test]
    fn umount_op_spelling() {
        let mut event = sample();
        event.op = MountOp::Umount;
        let record = event.into_record();
        assert_eq!(record.get("op_str"), Some(&Value::from("UMOUNT")));
    }

    #[test]
    fn schema_hides_raw_flags() {
        let schema = schema();
        assert!(schema.field("flags").is_some());
        assert!(schema.default_fields().all(|field| &**field.name() != "flags"));
    }
}
