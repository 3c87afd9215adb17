use approx::assert_relative_eq;
use ndarray::array;
use spech5_core::grammar::{is_dataset, is_group, is_link_to_dataset, is_link_to_group};
use spech5_core::{DType, Error, Payload};
use spech5_io::{Entry, Group, SpecH5, ViewConfig};
use std::collections::HashSet;

const SAMPLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/sample.dat");

fn open() -> SpecH5 {
    SpecH5::open(SAMPLE).unwrap()
}

fn dataset(sfh5: &SpecH5, path: &str) -> spech5_core::Dataset {
    sfh5.get(path).unwrap().into_dataset().unwrap()
}

fn floats(sfh5: &SpecH5, path: &str) -> Vec<f32> {
    dataset(sfh5, path).as_array().unwrap().iter().copied().collect()
}

/// Walks every member, following links, checking containment on the way.
fn check_members(group: &Group<'_>, names: &mut Vec<String>) {
    for key in group.keys().unwrap() {
        assert!(group.contains(&key), "{} should contain {key}", group.name());
        let entry = group.get(&key).unwrap();
        names.push(entry.name().to_string());
        if let Entry::Group(child) = entry {
            check_members(&child, names);
        }
    }
}

#[test]
fn test_root() {
    let sfh5 = open();
    assert_eq!(sfh5.keys(), vec!["1.1", "25.1", "1.2"]);
    assert_eq!(sfh5.name(), "/");
    assert_eq!(sfh5.attrs().get("NX_class").map(String::as_str), Some("NXroot"));
    assert_eq!(sfh5.to_string(), format!("<SpecH5 \"{SAMPLE}\" (3 members)>"));
    assert!(sfh5.contains("1.2"));
    assert!(!sfh5.contains("2.1"));
}

#[test]
fn test_scan_group() {
    let sfh5 = open();
    let scan = sfh5.get("/1.1").unwrap().into_group().unwrap();
    assert_eq!(
        scan.keys().unwrap(),
        vec!["title", "start_time", "instrument", "measurement"]
    );
    assert_eq!(scan.len(), 4);
    assert_eq!(scan.to_string(), "<SpecH5Group \"/1.1\" (4 members)>");
    assert_eq!(scan.attrs().get("NX_class").map(String::as_str), Some("NXentry"));
    assert_eq!(scan.scan_key(), Some("1.1"));
    assert_eq!(scan.parent().unwrap(), sfh5.root());
}

#[test]
fn test_round_trip_containment() {
    let sfh5 = open();
    let mut names = Vec::new();
    check_members(&sfh5.root(), &mut names);
    assert!(names.contains(&"/1.1/measurement/mca_1/info/live_time".to_string()));

    // Every path reached classifies into exactly one category.
    for name in &names {
        let flags = [
            is_group(name),
            is_dataset(name),
            is_link_to_group(name),
            is_link_to_dataset(name),
        ];
        assert_eq!(flags.iter().filter(|f| **f).count(), 1, "{name}");
    }
}

#[test]
fn test_title_and_start_time() {
    let sfh5 = open();
    assert_eq!(
        dataset(&sfh5, "/1.1/title").as_str(),
        Some("1 ascan  Pslit HGap 0 2  2 0.1")
    );
    assert_eq!(
        dataset(&sfh5, "/1.1/start_time").as_str(),
        Some("2015-03-14T03:53:50")
    );
    // No #D in the scan: the file header date is used.
    assert_eq!(
        dataset(&sfh5, "/25.1/start_time").as_str(),
        Some("2016-02-11T09:54:35")
    );
    assert_eq!(
        dataset(&sfh5, "/1.2/start_time").as_str(),
        Some("2016-05-06T23:00:01")
    );
}

#[test]
fn test_configured_time_zone() {
    let sfh5 = open().with_config(ViewConfig::new().with_time_zone("+01:00"));
    assert_eq!(
        dataset(&sfh5, "/1.1/start_time").as_str(),
        Some("2015-03-14T03:53:50+01:00")
    );
}

#[test]
fn test_positioners() {
    let sfh5 = open();
    let positioners = sfh5
        .get("/1.1/instrument/positioners")
        .unwrap()
        .into_group()
        .unwrap();
    assert_eq!(positioners.len(), 6);
    assert_eq!(
        positioners.attrs().get("NX_class").map(String::as_str),
        Some("NXcollection")
    );

    // Recorded as a column: the column wins over the #P value.
    let slit = dataset(&sfh5, "/1.1/instrument/positioners/Pslit HGap");
    assert_eq!(slit.shape(), &[3]);
    assert_eq!(
        floats(&sfh5, "/1.1/instrument/positioners/Pslit HGap"),
        vec![0.0, 1.0, 2.0]
    );

    let up = dataset(&sfh5, "/1.1/instrument/positioners/MRTSlit UP");
    assert_eq!(up.ndim(), 0);
    assert_relative_eq!(up.as_f32().unwrap(), 12.5);

    // Declared motors without a #P value read as +inf.
    let gap = dataset(&sfh5, "/1.1/instrument/positioners/Sslit1 VGap");
    assert_eq!(gap.as_f32(), Some(f32::INFINITY));
    let other = dataset(&sfh5, "/25.1/instrument/positioners/Pslit HGap");
    assert_eq!(other.as_f32(), Some(f32::INFINITY));
}

#[test]
fn test_measurement() {
    let sfh5 = open();
    let measurement = sfh5.get("/1.1/measurement").unwrap().into_group().unwrap();
    assert_eq!(
        measurement.keys().unwrap(),
        vec!["Epoch", "Pslit HGap", "det", "mca_0", "mca_1"]
    );
    let det = dataset(&sfh5, "/1.1/measurement/det");
    assert_eq!(det.dtype(), DType::Float32);
    assert_eq!(floats(&sfh5, "/1.1/measurement/det"), vec![5.0, 7.0, 9.0]);

    let plain = sfh5.get("/25.1/measurement").unwrap().into_group().unwrap();
    assert_eq!(plain.keys().unwrap(), vec!["Epoch", "Seconds"]);
    let instrument = sfh5.get("/25.1/instrument").unwrap().into_group().unwrap();
    assert_eq!(instrument.keys().unwrap(), vec!["positioners"]);
}

#[test]
fn test_demultiplexed_spectra() {
    let sfh5 = open();
    let instrument = sfh5.get("/1.1/instrument").unwrap().into_group().unwrap();
    assert_eq!(
        instrument.keys().unwrap(),
        vec!["positioners", "mca_0", "mca_1"]
    );

    let data = dataset(&sfh5, "/1.1/instrument/mca_1/data");
    assert_eq!(
        data.value(),
        &Payload::Float(array![[10.0, 11.0, 12.0], [13.0, 14.0, 15.0], [16.0, 17.0, 18.0]].into_dyn())
    );
    assert_eq!(
        data.attrs().get("interpretation").map(String::as_str),
        Some("spectrum")
    );
    assert_eq!(
        floats(&sfh5, "/1.1/instrument/mca_0/data"),
        vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]
    );
}

#[test]
fn test_mca_metadata() {
    let sfh5 = open();
    let mca = sfh5.get("/1.1/instrument/mca_0").unwrap().into_group().unwrap();
    assert_eq!(
        mca.keys().unwrap(),
        vec![
            "data",
            "calibration",
            "channels",
            "preset_time",
            "elapsed_time",
            "live_time"
        ]
    );
    assert_eq!(
        floats(&sfh5, "/1.1/instrument/mca_0/calibration"),
        vec![1.0, 2.0, 3.0]
    );
    assert_eq!(
        floats(&sfh5, "/1.1/instrument/mca_1/channels"),
        vec![0.0, 1.0, 2.0]
    );
    let preset = dataset(&sfh5, "/1.1/instrument/mca_0/preset_time");
    assert_relative_eq!(preset.as_f32().unwrap(), 123.4);
    let live = dataset(&sfh5, "/1.1/instrument/mca_0/live_time");
    assert_relative_eq!(live.as_f32().unwrap(), 234.5);
    let elapsed = dataset(&sfh5, "/1.1/instrument/mca_0/elapsed_time");
    assert_relative_eq!(elapsed.as_f32().unwrap(), 345.6);
}

#[test]
fn test_link_equivalence() {
    let sfh5 = open();
    let target = dataset(&sfh5, "/1.1/instrument/mca_0/data");
    let link = dataset(&sfh5, "/1.1/measurement/mca_0/data");
    let info_data = dataset(&sfh5, "/1.1/measurement/mca_0/info/data");
    assert!(!target.is_link());
    assert!(link.is_link());
    assert_eq!(link.name(), "/1.1/measurement/mca_0/data");
    assert_eq!(link.value(), target.value());
    assert_eq!(info_data.value(), target.value());
    assert_eq!(link.attrs(), target.attrs());

    let info = sfh5
        .get("/1.1/measurement/mca_0/info")
        .unwrap()
        .into_group()
        .unwrap();
    assert!(info.is_link());
    assert_eq!(
        info.attrs().get("NX_class").map(String::as_str),
        Some("NXdetector")
    );
    let instrument_mca = sfh5.get("/1.1/instrument/mca_0").unwrap().into_group().unwrap();
    assert_eq!(info.keys().unwrap(), instrument_mca.keys().unwrap());
    assert_ne!(info, instrument_mca);
    assert_eq!(
        dataset(&sfh5, "/1.1/measurement/mca_0/info/calibration").value(),
        dataset(&sfh5, "/1.1/instrument/mca_0/calibration").value()
    );
}

#[test]
fn test_visit_skips_links() {
    let sfh5 = open();
    let mut names = Vec::new();
    let found: Option<()> = sfh5
        .visit(|name| {
            names.push(name.to_string());
            None
        })
        .unwrap();
    assert_eq!(found, None);

    let unique: HashSet<&String> = names.iter().collect();
    assert_eq!(unique.len(), names.len());
    assert!(names.contains(&"/1.1/instrument/mca_0/data".to_string()));
    assert!(names.contains(&"/1.1/measurement/mca_0".to_string()));
    assert!(names.contains(&"/25.1/measurement/Seconds".to_string()));
    assert!(names
        .iter()
        .all(|n| !n.contains("/measurement/mca_0/") && !n.contains("/measurement/mca_1/")));

    let mut item_names = Vec::new();
    sfh5.visititems(|name, entry| {
        assert!(!entry.is_link());
        assert_eq!(name, entry.name());
        item_names.push(name.to_string());
        None::<()>
    })
    .unwrap();
    assert_eq!(item_names, names);
}

#[test]
fn test_visit_early_exit() {
    let sfh5 = open();
    let mut calls = 0;
    let found = sfh5
        .visit(|name| {
            calls += 1;
            name.ends_with("/positioners").then(|| name.to_string())
        })
        .unwrap();
    assert_eq!(found.as_deref(), Some("/1.1/instrument/positioners"));
    assert_eq!(calls, 5);

    let scan = sfh5.get("1.2").unwrap().into_group().unwrap();
    let first_dataset = scan
        .visititems(|name, entry| entry.is_dataset().then(|| name.to_string()))
        .unwrap();
    assert_eq!(first_dataset.as_deref(), Some("/1.2/title"));
}

#[test]
fn test_scoping_and_missing_members() {
    let sfh5 = open();
    let scan = sfh5.get("/1.1").unwrap().into_group().unwrap();

    assert_eq!(
        scan.get("/25.1/title").unwrap_err(),
        Error::KeyNotInScope {
            key: "/25.1/title".to_string(),
            group: "/1.1".to_string()
        }
    );
    assert!(!scan.contains("/25.1/title"));
    assert!(scan.contains("/1.1/title"));
    assert!(scan.contains("instrument/positioners/"));

    assert!(matches!(
        sfh5.get("/1.1/spam"),
        Err(Error::UnrecognizedPath(_))
    ));
    assert!(matches!(sfh5.get("/9.1"), Err(Error::ScanNotFound { .. })));
    for missing in [
        "/1.1/instrument/mca_2",
        "/1.1/measurement/mca_2/data",
        "/1.1/measurement/nope",
        "/1.1/instrument/positioners/nope",
        "/25.1/instrument/mca_0/preset_time",
    ] {
        assert!(!sfh5.contains(missing), "{missing}");
        assert!(sfh5.get(missing).is_err(), "{missing}");
    }
}

#[test]
fn test_equality() {
    let sfh5 = open();
    let a = sfh5.get("/1.1/instrument").unwrap();
    let b = sfh5.root().get("1.1").unwrap().into_group().unwrap().get("instrument").unwrap();
    assert_eq!(a, b);
    assert_ne!(a, sfh5.get("/1.2/instrument").unwrap());
    assert_eq!(open(), sfh5);
}
