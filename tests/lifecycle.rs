//! Process-wide setup and teardown.
//!
//! The library slot is global, so everything runs inside one test.

use std::io::Write;

use tempfile::NamedTempFile;

use cobalt::library::is_initialized;
use cobalt::{
    get_solution, setup, teardown, DataType, Device, GemmConfig, LibraryConfig, Problem, SetupError, Status,
};

const MANIFEST: &str = r#"{
  "devices": [{ "name": "Tahiti", "num_compute_units": 32, "clock_frequency": 925 }],
  "solutions": [{
    "device": "Tahiti",
    "data_type": "double",
    "rank_c": 2,
    "index_assignments_a": [0, 2],
    "index_assignments_b": [2, 1],
    "tiles": [{ "macro0": 32, "macro1": 32, "unroll": 8 }],
    "name": "dgemm_nn"
  }]
}"#;

fn manifest_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_setup_teardown_lifecycle() {
    let tahiti = Device::new("Tahiti", 32, 925);
    let nn = Problem::gemm(&GemmConfig::new(256, 256, 64, DataType::Double, tahiti.clone()));
    let tn = Problem::gemm(&GemmConfig::new(256, 256, 64, DataType::Double, tahiti).transposed(true, false));

    assert!(!is_initialized());
    assert_eq!(get_solution(&nn).unwrap_err(), Status::NotInitialized);
    assert_eq!(teardown().unwrap_err(), Status::NotInitialized);

    // unparseable manifests leave the library unset
    let broken = manifest_file("{ \"devices\": ");
    let err = setup(&LibraryConfig::new().with_manifest(broken.path())).unwrap_err();
    assert!(matches!(err, SetupError::Manifest(_)));
    assert!(!is_initialized());

    let missing = setup(&LibraryConfig::new().with_manifest("/nonexistent/cobalt.json")).unwrap_err();
    assert!(matches!(missing, SetupError::Manifest(_)));

    let file = manifest_file(MANIFEST);
    setup(&LibraryConfig::new().with_manifest(file.path())).unwrap();
    assert!(is_initialized());

    let handle = get_solution(&nn).unwrap();
    assert_eq!(handle.name(), "dgemm_nn_MT32x32_U8");
    assert_eq!(handle.status(), Status::Success);
    assert_eq!(get_solution(&tn).unwrap_err(), Status::ProblemNotFound);

    assert!(matches!(
        setup(&LibraryConfig::new()),
        Err(SetupError::AlreadyInitialized)
    ));

    teardown().unwrap();
    assert!(!is_initialized());
    assert_eq!(get_solution(&nn).unwrap_err(), Status::NotInitialized);

    // handles outlive the library
    assert_eq!(handle.problem().family(), nn.family());

    // and it can be set up again
    setup(&LibraryConfig::new().with_device(Device::new("Host", 1, 0))).unwrap();
    teardown().unwrap();
}
