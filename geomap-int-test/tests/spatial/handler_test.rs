use geomap_int_test::test_util::{
    cleanup, create_roads_test_context, random_path, register_spatial_functions, run_test,
    TEST_SPATIALITE_VERSION,
};
use geomap_spatial::{
    BoundingBox, OpenMode, SpatialDatabaseConfig, SpatialDatabaseHandler, SpatialError,
    VERSION_UNAVAILABLE, WGS84,
};
use std::path::Path;
use std::thread;
use std::time::Duration;

#[test]
fn test_version_queries() {
    run_test(
        || create_roads_test_context(0),
        |ctx| {
            ctx.db().with_handler(|handler| {
                assert_eq!(handler.spatialite_version()?, TEST_SPATIALITE_VERSION);
                // proj4_version() answers NULL
                assert_eq!(handler.proj4_version()?, VERSION_UNAVAILABLE);
                // geos_version() does not exist on this connection
                assert!(handler.geos_version().unwrap_err().is_query_failure());
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_open_in_missing_directory() {
    let path = Path::new(&random_path()).join("nested").join("map.sqlite");
    let err = SpatialDatabaseHandler::open(&path).err().expect("open must fail");
    assert!(err.is_connection_failure());
    assert!(matches!(err, SpatialError::ConnectionFailure { .. }));
    assert!(!path.exists());
}

#[test]
fn test_read_only_mode() {
    run_test(
        || create_roads_test_context(3),
        |ctx| {
            let config = SpatialDatabaseConfig::new(ctx.path())
                .with_open_mode(OpenMode::ReadOnly)
                .with_busy_timeout(Duration::from_millis(200));
            let reader = SpatialDatabaseHandler::open_with_config(config)?;
            register_spatial_functions(reader.connection()?);

            let roads = reader.list_tables()?.remove(0);
            let world = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
            assert_eq!(reader.fetch_all_wkb_in_bounds(WGS84, &roads, &world)?.len(), 3);
            assert!(reader
                .connection()?
                .execute_batch("DELETE FROM roads;")
                .is_err());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_close_is_idempotent() {
    run_test(
        || create_roads_test_context(1),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let roads = handler.list_tables()?.remove(0);
                handler.close();
                handler.close();
                assert!(handler.is_closed());

                assert!(matches!(handler.list_tables(), Err(SpatialError::Closed)));
                assert!(matches!(handler.proj4_version(), Err(SpatialError::Closed)));
                assert!(matches!(
                    handler.open_geometry_cursor(WGS84, &roads, &BoundingBox::default()),
                    Err(SpatialError::Closed)
                ));
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_shared_handler_across_threads() {
    run_test(
        || create_roads_test_context(12),
        |ctx| {
            let world = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
            let workers: Vec<_> = (0..6)
                .map(|_| {
                    let db = ctx.db();
                    let world = world.clone();
                    thread::spawn(move || {
                        db.with_handler(|handler| {
                            let roads = handler.list_tables()?.remove(0);
                            handler.with_geometry_iterator(WGS84, &roads, &world, |geometries| {
                                geometries.filter(|g| g.is_ok()).count()
                            })
                        })
                    })
                })
                .collect();

            for worker in workers {
                let count = worker.join().expect("worker panicked")?;
                assert_eq!(count, 12);
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
