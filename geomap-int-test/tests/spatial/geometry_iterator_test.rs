use geomap_int_test::test_util::{cleanup, create_roads_test_context, road, run_test};
use geomap_spatial::{
    BoundingBox, Geometry, GeometryCodec, SpatialResult, WkbCodec, WEB_MERCATOR, WGS84,
};

const ROWS: usize = 25;

fn world() -> BoundingBox {
    BoundingBox::new(-180.0, -90.0, 180.0, 90.0)
}

#[test]
fn test_n_rows_n_advances_then_exhaustion() {
    run_test(
        || create_roads_test_context(ROWS),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let roads = handler.list_tables()?.remove(0);
                let mut cursor = handler.open_geometry_cursor(WGS84, &roads, &world())?;
                let mut geometries = cursor.geometries()?;

                for i in 0..ROWS {
                    let geometry = geometries.advance()?.expect("row available");
                    assert_eq!(geometry, road(i as f64));
                }
                assert_eq!(geometries.produced(), ROWS);
                assert!(geometries.advance()?.is_none());
                assert!(geometries.is_disposed());
                assert!(geometries.advance()?.is_none());
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_eager_and_lazy_paths_agree() {
    run_test(
        || create_roads_test_context(ROWS),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let roads = handler.list_tables()?.remove(0);
                let bbox = BoundingBox::new(-1.0e7, -1.0e7, 1.0e7, 1.0e7);

                let codec = WkbCodec::new();
                let eager = handler
                    .fetch_all_wkb_in_bounds(WEB_MERCATOR, &roads, &bbox)?
                    .iter()
                    .map(|blob| codec.decode(blob))
                    .collect::<SpatialResult<Vec<Geometry>>>()?;

                let lazy =
                    handler.with_geometry_iterator(WEB_MERCATOR, &roads, &bbox, |geometries| {
                        geometries.collect::<SpatialResult<Vec<Geometry>>>()
                    })??;

                assert!(!eager.is_empty());
                assert_eq!(eager, lazy);
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_dispose_twice_and_early_exit() {
    run_test(
        || create_roads_test_context(ROWS),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let roads = handler.list_tables()?.remove(0);

                let mut cursor = handler.open_geometry_cursor(WGS84, &roads, &world())?;
                {
                    let mut geometries = cursor.geometries()?;
                    assert!(geometries.advance()?.is_some());
                    geometries.dispose();
                    geometries.dispose();
                    assert!(geometries.advance()?.is_none());
                }
                cursor.dispose();
                cursor.dispose();
                assert!(cursor.is_disposed());
                drop(cursor);

                // stopping early releases everything on the way out
                let first_three =
                    handler.with_geometry_iterator(WGS84, &roads, &world(), |geometries| {
                        geometries.take(3).collect::<SpatialResult<Vec<_>>>()
                    })??;
                assert_eq!(first_three.len(), 3);

                // the connection is free again, so it can be closed cleanly
                handler.close();
                assert!(handler.is_closed());
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_bad_row_does_not_end_iteration() {
    run_test(
        || create_roads_test_context(2),
        |ctx| {
            ctx.db().with_handler(|handler| {
                handler
                    .connection()?
                    .execute("INSERT INTO roads (geom) VALUES (x'0102')", [])
                    .expect("insert bad row");
                let codec = WkbCodec::new();
                let last = codec.encode(&road(5.0))?;
                handler
                    .connection()?
                    .execute("INSERT INTO roads (geom) VALUES (?1)", [last])
                    .expect("insert last row");

                let roads = handler.list_tables()?.remove(0);
                let results = handler.with_geometry_iterator(WGS84, &roads, &world(), |geometries| {
                    geometries
                        .map(|result| result.map_err(|e| e.is_decode_failure()))
                        .collect::<Vec<_>>()
                })?;

                assert_eq!(results.len(), 4);
                assert_eq!(results[0], Ok(road(0.0)));
                assert_eq!(results[1], Ok(road(1.0)));
                assert_eq!(results[2], Err(true));
                assert_eq!(results[3], Ok(road(5.0)));
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}
