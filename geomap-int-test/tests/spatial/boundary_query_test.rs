use geo::MapCoords;
use geo_types::coord;
use geomap_int_test::test_util::{
    cleanup, create_roads_table, create_roads_test_context, insert_geometry, road, run_test,
};
use geomap_spatial::test_support::to_web_mercator;
use geomap_spatial::{
    BoundaryQueryBuilder, BoundingBox, GeometryCodec, SpatialTable, WkbCodec, WEB_MERCATOR,
    WGS84,
};

fn roads() -> SpatialTable {
    SpatialTable::new("roads", "geom", "LINESTRING", 4326).expect("roads table")
}

#[test]
fn test_same_srid_query_uses_raw_column() {
    let bbox = BoundingBox::from_edges(46.0, 45.0, 11.0, 10.0);
    let query = BoundaryQueryBuilder::build(WGS84, &roads(), &bbox);
    assert_eq!(
        query.sql(),
        "SELECT ST_AsBinary(geom) from roads where \
         MBRIntersects(BuildMBR(10.0, 45.0, 11.0, 46.0),geom);"
    );
}

#[test]
fn test_reprojected_query_wraps_projection_and_predicate() {
    let bbox = BoundingBox::from_edges(46.0, 45.0, 11.0, 10.0);
    let query = BoundaryQueryBuilder::build(WEB_MERCATOR, &roads(), &bbox);
    assert_eq!(
        query.sql(),
        "SELECT ST_AsBinary(ST_Transform(geom,3857)) from roads where \
         MBRIntersects(BuildMBR(10.0, 45.0, 11.0, 46.0),ST_Transform(geom,3857));"
    );
}

#[test]
fn test_fetch_in_native_srid() {
    run_test(
        || create_roads_test_context(8),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let roads = handler.list_tables()?.remove(0);

                // roads starting at 2, 3 and 4 degrees
                let bbox = BoundingBox::new(2.4, 2.4, 4.2, 4.2);
                let blobs = handler.fetch_all_wkb_in_bounds(WGS84, &roads, &bbox)?;
                assert_eq!(blobs.len(), 3);

                let codec = WkbCodec::new();
                let first = codec.decode(&blobs[0])?;
                assert_eq!(first, road(2.0));
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_fetch_reprojected_to_web_mercator() {
    run_test(
        || create_roads_test_context(4),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let roads = handler.list_tables()?.remove(0);
                let query =
                    handler.boundary_query(WEB_MERCATOR, &roads, &BoundingBox::default())?;
                assert!(query.is_transformed());

                // (1, 1) to (2.5, 2.5) degrees, in meters
                let south_west = to_web_mercator(coord! { x: 1.0, y: 1.0 });
                let north_east = to_web_mercator(coord! { x: 2.5, y: 2.5 });
                let bbox = BoundingBox::new(south_west.x, south_west.y, north_east.x, north_east.y);

                let blobs = handler.fetch_all_wkb_in_bounds(WEB_MERCATOR, &roads, &bbox)?;
                assert_eq!(blobs.len(), 2);

                let codec = WkbCodec::new();
                let expected = road(1.0).map_coords(to_web_mercator);
                assert_eq!(codec.decode(&blobs[0])?, expected);
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_degenerate_and_non_finite_boxes_pass_through() {
    run_test(
        || create_roads_test_context(3),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let roads = handler.list_tables()?.remove(0);

                // a point box on the first vertex of the second road
                let point = BoundingBox::new(1.0, 1.0, 1.0, 1.0);
                assert!(point.is_degenerate());
                assert_eq!(handler.fetch_all_wkb_in_bounds(WGS84, &roads, &point)?.len(), 1);

                // BuildMBR takes any two opposite corners
                let inverted = BoundingBox::new(10.0, 10.0, -10.0, -10.0);
                let query = handler.boundary_query(WGS84, &roads, &inverted)?;
                assert!(query.sql().contains("BuildMBR(10.0, 10.0, -10.0, -10.0)"));
                assert_eq!(handler.fetch_all_wkb_in_bounds(WGS84, &roads, &inverted)?.len(), 3);

                let nan = BoundingBox::new(f64::NAN, 0.0, 10.0, 10.0);
                let query = handler.boundary_query(WGS84, &roads, &nan)?;
                assert!(query.sql().contains("BuildMBR(NULL, 0.0, 10.0, 10.0)"));
                assert!(handler.fetch_all_wkb_in_bounds(WGS84, &roads, &nan)?.is_empty());
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_unknown_table_is_query_failure() {
    run_test(
        || create_roads_test_context(1),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let rivers = SpatialTable::new("rivers", "geom", "LINESTRING", 4326)?;
                let err = handler
                    .fetch_all_wkb_in_bounds(WGS84, &rivers, &BoundingBox::default())
                    .unwrap_err();
                assert!(err.is_query_failure());

                insert_geometry(handler.connection()?, "roads", &road(0.0));
                let bbox = BoundingBox::new(-1.0, -1.0, 0.9, 0.9);
                let blobs = handler.fetch_all_wkb_in_bounds(WGS84, &roads(), &bbox)?;
                assert_eq!(blobs.len(), 2);
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_keyword_named_table() {
    run_test(
        || create_roads_test_context(0),
        |ctx| {
            ctx.db().with_handler(|handler| {
                let conn = handler.connection()?;
                create_roads_table(conn, "order", 4326);
                insert_geometry(conn, "order", &road(1.0));

                let order = handler
                    .list_tables()?
                    .into_iter()
                    .find(|table| table.name() == "order")
                    .expect("order table listed");
                let bbox = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
                let query = handler.boundary_query(WGS84, &order, &bbox)?;
                assert!(query.sql().contains("from \"order\" where"));

                let blobs = handler.fetch_all_wkb_in_bounds(WGS84, &order, &bbox)?;
                assert_eq!(blobs.len(), 1);
                assert_eq!(WkbCodec::new().decode(&blobs[0])?, road(1.0));
                Ok(())
            })
        },
        |ctx| cleanup(ctx),
    )
}
