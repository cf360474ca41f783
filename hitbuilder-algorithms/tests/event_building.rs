use approx::assert_relative_eq;
use hitbuilder_algorithms::{
    addback, build_events, decode_and_build, suppress, AnalysisOptions, ChannelMap, Descant,
    DetectorArray, RawFragment, Sceptar, StreamItem,
};
use hitbuilder_core::{
    ArrayKind, ChannelAddress, ChannelInfo, ChannelRole, DetectorHit, PositionTable, Vec3,
};
use std::sync::Arc;

fn sceptar() -> Sceptar {
    let points = (0..Sceptar::PADDLES)
        .map(|i| {
            let angle = f64::from(u32::try_from(i).unwrap()) * 0.3;
            Vec3::new(angle.cos(), angle.sin(), 0.5)
        })
        .collect();
    Sceptar::new(Arc::new(PositionTable::from_points(points)))
}

fn paddle_channels() -> ChannelMap {
    (1..=20)
        .map(|p: u16| ChannelInfo::new(u32::from(p), ChannelAddress::new(p, 0)))
        .collect()
}

fn fragment(channel: u32, timestamp: u64, charge: f64) -> RawFragment {
    RawFragment::new(ArrayKind::Sceptar, channel, timestamp, charge)
}

#[test]
fn test_timestamp_building_with_addback() {
    let array = sceptar();
    let channels = paddle_channels();
    let options = AnalysisOptions::default().with_build_events_by_timestamp(true);

    let output = decode_and_build(
        &array,
        &channels,
        &options,
        &[
            fragment(1, 100, 50.0),
            fragment(2, 150, 60.0),
            fragment(3, 5000, 70.0),
        ],
    );

    assert_eq!(output.events.len(), 2);
    let first = &output.events[0];
    assert_eq!(first.multiplicity(), 1);
    assert_relative_eq!(first.hit_at(0).unwrap().energy(), 110.0);
    assert_eq!(first.hit_at(0).unwrap().timestamp(), 100);

    let second = &output.events[1];
    assert_eq!(second.multiplicity(), 1);
    assert_relative_eq!(second.hit_at(0).unwrap().energy(), 70.0);
    assert_eq!(second.hit_at(0).unwrap().timestamp(), 5000);
}

#[test]
fn test_empty_stream() {
    let array = sceptar();
    let output = build_events(
        &array,
        &paddle_channels(),
        &AnalysisOptions::default(),
        std::iter::empty(),
    );
    assert_eq!(output.events.len(), 1);
    assert_eq!(output.events[0].multiplicity(), 0);
    assert!(!output.events[0].hit());
    assert!(output.events[0].hit_at(0).is_err());
}

#[test]
fn test_multiplicity_matches_hit_count() {
    let array = sceptar();
    let channels = paddle_channels();
    let options = AnalysisOptions::default()
        .with_build_events_by_timestamp(true)
        .with_build_window(500);

    let fragments: Vec<RawFragment> = (0..60_u32)
        .map(|i| fragment(1 + i % 20, u64::from(i) * 97, f64::from(i) + 1.0))
        .collect();
    let output = decode_and_build(&array, &channels, &options, &fragments);

    for event in &output.events {
        assert_eq!(event.multiplicity(), event.hits().len());
        assert_eq!(event.multiplicity(), event.iter().count());
    }
    let total: usize = output.events.iter().map(|e| e.multiplicity()).sum();
    assert_eq!(total, output.statistics.hits_out);
    assert_eq!(
        output.statistics.hits_in,
        output.statistics.hits_out + output.statistics.merged + output.statistics.suppressed
    );
}

#[test]
fn test_addback_conserves_energy() {
    let array = sceptar();
    let hits: Vec<DetectorHit> = (0..30_u16)
        .map(|i| {
            DetectorHit::at(
                u32::from(i % 20 + 1),
                ChannelAddress::new(i % 20 + 1, 0),
                f64::from(i) * 3.5,
                u64::from(i) * 41 % 700,
            )
        })
        .collect();
    let total_in: f64 = hits.iter().map(DetectorHit::energy).sum();

    for window in [0, 50, 300, 10_000] {
        let merged = addback(hits.clone(), window, |a, b| array.are_neighbours(a, b));
        assert!(merged.len() <= hits.len());
        let total_out: f64 = merged.iter().map(DetectorHit::energy).sum();
        assert_relative_eq!(total_in, total_out, epsilon = 1e-9);
    }
}

#[test]
fn test_suppression_never_drops_energetic_hits() {
    let hits: Vec<DetectorHit> = (0..20_u16)
        .map(|i| {
            DetectorHit::at(
                u32::from(i),
                ChannelAddress::new(i % 4, 0),
                f64::from(i) * 10.0,
                100,
            )
        })
        .collect();
    let vetoes: Vec<DetectorHit> = (0..4_u16)
        .map(|d| {
            let veto = DetectorHit::at(90 + u32::from(d), ChannelAddress::new(d, 1), 1.0, 100);
            let mut core = *veto.core();
            core.role = ChannelRole::Veto;
            DetectorHit::new(core)
        })
        .collect();

    let threshold = 95.0;
    let (kept, dropped) = suppress(hits.clone(), &vetoes, 300.0, threshold);
    assert_eq!(kept.len() + dropped, hits.len());
    for hit in hits.iter().filter(|h| h.energy() >= threshold) {
        assert!(kept.iter().any(|k| k.channel() == hit.channel()));
    }
    assert!(kept.iter().all(|k| k.energy() >= threshold));
}

#[test]
fn test_veto_channel_suppresses_in_stream() {
    let array = sceptar();
    let mut channels = paddle_channels();
    channels.insert(ChannelInfo::new(100, ChannelAddress::new(5, 1)).with_role(ChannelRole::Veto));
    let mut options = AnalysisOptions::default();
    options.set_suppression_energy(25.0).unwrap();

    let items = vec![
        StreamItem::Fragment(fragment(5, 1000, 20.0)),
        StreamItem::Fragment(fragment(100, 1010, 500.0)),
        StreamItem::Fragment(fragment(12, 1000, 20.0)),
        StreamItem::Trigger,
    ];
    let output = build_events(&array, &channels, &options, items);

    assert_eq!(output.events.len(), 1);
    let event = &output.events[0];
    assert_eq!(event.multiplicity(), 1);
    assert_eq!(event.hit_at(0).unwrap().channel(), 12);
    assert_eq!(output.statistics.vetoes_in, 1);
    assert_eq!(output.statistics.suppressed, 1);
}

#[test]
fn test_unknown_channel_is_kept() {
    let array = sceptar();
    let options = AnalysisOptions::default().with_build_events_by_timestamp(true);
    let output = decode_and_build(
        &array,
        &paddle_channels(),
        &options,
        &[fragment(1, 100, 10.0), fragment(4242, 110, 33.0)],
    );
    assert_eq!(output.events.len(), 1);
    let event = &output.events[0];
    assert_eq!(event.multiplicity(), 2);
    let unknown = event.iter().find(|h| h.channel() == 4242).unwrap();
    assert!(unknown.address().is_none());
    assert_relative_eq!(unknown.energy(), 33.0);
    assert!(array.hit_position(unknown, None).is_err());
}

#[test]
fn test_descant_positions_follow_layout() {
    let table = PositionTable::new(vec![
        vec![Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 2.0, 0.0)],
        vec![Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -3.0)],
    ])
    .unwrap();
    let array = Descant::new(Arc::new(table));

    let p = array.position(ChannelAddress::new(0, 1), None).unwrap();
    assert_relative_eq!(p.magnitude(), Descant::DEFAULT_DISTANCE);
    assert_relative_eq!(p.y, Descant::DEFAULT_DISTANCE);

    let p = array.position(ChannelAddress::new(1, 1), Some(10.0)).unwrap();
    assert_relative_eq!(p.z, -10.0);

    assert!(array.position(ChannelAddress::new(2, 0), None).is_err());
    assert!(array.position(ChannelAddress::new(0, 2), None).is_err());
}

#[test]
fn test_cleared_transients_restore_raw_energy() {
    let array = sceptar();
    let channels: ChannelMap = [ChannelInfo::new(7, ChannelAddress::new(7, 0))
        .with_cross_talk_factor(0.8)]
    .into_iter()
    .collect();
    let options = AnalysisOptions::default();

    let output = build_events(
        &array,
        &channels,
        &options,
        vec![StreamItem::Fragment(fragment(7, 0, 100.0)), StreamItem::Trigger],
    );
    let mut event = output.events.into_iter().next().unwrap();
    assert_relative_eq!(event.hit_at(0).unwrap().energy(), 80.0);

    event.clear_transients();
    assert_relative_eq!(event.hit_at(0).unwrap().energy(), 100.0);
}
