//! Task snapshot round-trip, with and without a thumbnail.

use crate::case::{check, check_eq, Case, CaseContext, CaseResult};
use crate::cases::stubs::ProbeComponent;
use async_trait::async_trait;
use runtime::{Host, PixelFormat, TaskSnapshot, Thumbnail};
use testkit::CallbackLog;

pub struct SnapshotRoundTripCase;

#[async_trait]
impl Case for SnapshotRoundTripCase {
    fn name(&self) -> &str {
        "snapshot-roundtrip"
    }

    fn description(&self) -> &str {
        "a task snapshot round-trips through bytes with thumbnail metadata intact"
    }

    async fn run(&self, _ctx: &CaseContext) -> CaseResult {
        let host = Host::new();
        let log = CallbackLog::new();
        host.launch(Box::new(ProbeComponent::new("base", log.clone())))
            .await?;
        let top = host
            .launch(Box::new(ProbeComponent::new("top", log.clone())))
            .await?;
        host.pause(top).await?;

        let snapshot = host.task_snapshot().await?;
        check_eq(
            snapshot.base_component.as_deref(),
            Some("base"),
            "base component name",
        )?;
        check_eq(
            snapshot.top_component.as_deref(),
            Some("top"),
            "top component name",
        )?;
        check_eq(snapshot.component_count, 2, "component count")?;
        check_eq(snapshot.running_count, 1, "running count")?;
        check(snapshot.thumbnail.is_none(), "fresh snapshot has no thumbnail")?;

        // bare round-trip keeps absent fields absent
        let bare = TaskSnapshot::from_bytes(&snapshot.to_bytes()?)?;
        check_eq(bare.clone(), snapshot.clone(), "bare snapshot round-trip")?;
        check(bare.thumbnail.is_none(), "round-trip must not invent a thumbnail")?;

        // with a thumbnail, dimensions and format survive intact
        let mut with_thumbnail = snapshot;
        with_thumbnail.thumbnail = Some(Thumbnail::new(480, 320, PixelFormat::Rgb565));
        let back = TaskSnapshot::from_bytes(&with_thumbnail.to_bytes()?)?;
        let thumbnail = match back.thumbnail {
            Some(thumbnail) => thumbnail,
            None => return check(false, "thumbnail lost in round-trip"),
        };
        check_eq(thumbnail.width, 480, "thumbnail width")?;
        check_eq(thumbnail.height, 320, "thumbnail height")?;
        check_eq(thumbnail.format, PixelFormat::Rgb565, "thumbnail format")?;

        host.shutdown().await?;
        Ok(())
    }
}
