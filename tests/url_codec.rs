use pixelbin::url::{AssetTarget, TransformationParam};
use pixelbin::{
    obj_to_url, url_to_obj, Dpr, PixelbinError, Transformation, UrlObject, Version,
};

const FILE: &str = "__playground/playground-default.jpeg";

fn params(pairs: &[(&str, &str)]) -> Vec<TransformationParam> {
    pairs
        .iter()
        .map(|(k, v)| TransformationParam::new(*k, *v))
        .collect()
}

fn resize() -> Transformation {
    Transformation::operation("t", "resize")
        .param("h", "200")
        .param("w", "100")
        .param("fill", "999")
}

fn zoned(transformations: Vec<Transformation>) -> UrlObject {
    let mut obj = UrlObject::new("red-scene-95b6ea", FILE).zone("z-slug");
    obj.transformations = transformations;
    obj
}

#[test]
fn test_parse_versioned_url() {
    let _ = env_logger::try_init();

    let obj = url_to_obj(
        "https://cdn.pixelbin.io/v2/red-scene-95b6ea/t.resize()/__playground/playground-default.jpeg",
    )
    .unwrap();
    assert_eq!(obj.base_url, "https://cdn.pixelbin.io");
    assert_eq!(obj.version, Version::V2);
    assert_eq!(obj.cloud_name.as_deref(), Some("red-scene-95b6ea"));
    assert_eq!(obj.zone, None);
    assert_eq!(obj.pattern.as_deref(), Some("t.resize()"));
    assert_eq!(obj.target, AssetTarget::File(FILE.to_string()));
    assert_eq!(obj.transformations, vec![Transformation::operation("t", "resize")]);
}

#[test]
fn test_parse_without_version_defaults_to_v1() {
    let obj = url_to_obj(
        "https://cdn.pixelbin.io/red-scene-95b6ea/t.resize()/__playground/playground-default.jpeg",
    )
    .unwrap();
    assert_eq!(obj.version, Version::V1);
    assert_eq!(obj.cloud_name.as_deref(), Some("red-scene-95b6ea"));
}

#[test]
fn test_parse_zone_on_alternate_pixelbin_host() {
    let obj = url_to_obj(
        "https://cdn.pixelbinx0.de/red-scene-95b6ea/zonesl/t.resize()/__playground/playground-default.jpeg",
    )
    .unwrap();
    assert_eq!(obj.base_url, "https://cdn.pixelbinx0.de");
    assert_eq!(obj.zone.as_deref(), Some("zonesl"));
    assert_eq!(obj.version, Version::V1);
    assert!(!obj.is_custom_domain);
}

#[test]
fn test_parse_operation_chain_in_order() {
    let obj = url_to_obj(
        "https://cdn.pixelbin.io/v2/red-scene-95b6ea/t.resize(h:200,w:100,fill:999)~erase.bg()~t.extend()/__playground/playground-default.jpeg",
    )
    .unwrap();
    assert_eq!(
        obj.transformations,
        vec![
            resize(),
            Transformation::operation("erase", "bg"),
            Transformation::operation("t", "extend"),
        ]
    );
}

#[test]
fn test_parse_presets() {
    let cases = [
        (
            "t.resize(h:200,w:100)~p:preset1(a:100,b:2.1,c:test)",
            params(&[("a", "100"), ("b", "2.1"), ("c", "test")]),
        ),
        ("t.resize(h:200,w:100)~p:preset1", Vec::new()),
        ("t.resize(h:200,w:100)~p:preset1()", Vec::new()),
        // unterminated parameter list
        ("t.resize(h:200,w:100)~p:preset1(a:12", params(&[("a", "12")])),
    ];

    for (pattern, values) in cases {
        let url = format!("https://cdn.pixelbin.io/v2/red-scene-95b6ea/{}/{}", pattern, FILE);
        let obj = url_to_obj(&url).unwrap();
        assert_eq!(obj.pattern.as_deref(), Some(pattern));
        assert_eq!(
            obj.transformations,
            vec![
                Transformation::operation("t", "resize")
                    .param("h", "200")
                    .param("w", "100"),
                Transformation::Preset {
                    name: "preset1".to_string(),
                    values,
                },
            ],
            "pattern {}",
            pattern
        );
    }
}

#[test]
fn test_parse_legacy_preset_apply() {
    let obj = url_to_obj(
        "https://cdn.pixelbin.io/v2/red-scene-95b6ea/t.compress()~p.apply(n:presetNameXyx)/a.jpeg",
    )
    .unwrap();
    assert_eq!(
        obj.transformations[1],
        Transformation::LegacyPresetApply {
            name: "presetNameXyx".to_string()
        }
    );
    assert_eq!(
        obj_to_url(&obj).unwrap(),
        "https://cdn.pixelbin.io/v2/red-scene-95b6ea/t.compress()~p:presetNameXyx/a.jpeg"
    );
}

#[test]
fn test_parse_rejects_malformed_patterns() {
    for url in [
        // four-letter segment is neither a zone nor a pattern
        "https://cdn.pixelbin.io/v2/red-scene-95b6ea/test/t.compress()~t.resize()~t.extend()~p.apply(n:presetNameXyx)/alien_fig_tree_planet_x_wallingford_seattle_washington_usa_517559.jpeg",
        "https://cdn.pixelbin.io/v2/red-scene-95b6ea/t.compress~t.resize()~t.extend()~p.apply(n:presetNameXyx)/alien_fig_tree_planet_x_wallingford_seattle_washington_usa_517559.jpeg",
    ] {
        let err = url_to_obj(url).unwrap_err();
        assert!(
            err.to_string().contains("Error Processing url"),
            "unexpected error: {}",
            err
        );
    }
}

#[test]
fn test_parse_rejects_unknown_version() {
    let result = url_to_obj("https://cdn.pixelbin.io/v3/red-scene-95b6ea/original/a.jpeg");
    assert!(matches!(result, Err(PixelbinError::InvalidUrl { .. })));
}

#[test]
fn test_parse_query_options() {
    let obj = url_to_obj(
        "https://cdn.pixelbin.io/v2/feel/erase.bg(shadow:true)~t.merge(m:underlay,i:eU44YkFJOHlVMmZrWVRDOUNTRm1D,b:screen,r:true)/MZZKB3e1hT48o0NYJ2Kxh.jpeg?dpr=2.5&f_auto=true",
    )
    .unwrap();
    assert_eq!(obj.cloud_name.as_deref(), Some("feel"));
    assert_eq!(obj.file_path(), Some("MZZKB3e1hT48o0NYJ2Kxh.jpeg"));
    assert_eq!(obj.options.dpr, Some(Dpr::Value(2.5)));
    assert_eq!(obj.options.f_auto, Some(true));
    assert_eq!(
        obj.transformations[1],
        Transformation::operation("t", "merge")
            .param("m", "underlay")
            .param("i", "eU44YkFJOHlVMmZrWVRDOUNTRm1D")
            .param("b", "screen")
            .param("r", "true")
    );
}

#[test]
fn test_parse_rejects_out_of_range_dpr() {
    let result = url_to_obj(
        "https://cdn.pixelbin.io/v2/feel/erase.bg(shadow:true)/MZZKB3e1hT48o0NYJ2Kxh.jpeg?dpr=5.5&f_auto=true",
    );
    assert!(matches!(
        result,
        Err(PixelbinError::IllegalQueryParameter { .. })
    ));
}

#[test]
fn test_parse_non_boolean_f_auto_reads_false() {
    for raw in ["abc", "yes", "1"] {
        let url = format!("https://cdn.pixelbin.io/v2/feel/original/a.jpeg?f_auto={}", raw);
        let obj = url_to_obj(&url).unwrap();
        assert_eq!(obj.options.f_auto, Some(false), "f_auto={}", raw);
        assert!(obj.options.extra.is_empty());
    }

    let obj = url_to_obj("https://cdn.pixelbin.io/v2/feel/original/a.jpeg?f_auto=True").unwrap();
    assert_eq!(obj.options.f_auto, Some(true));
}

#[test]
fn test_parse_worker_urls() {
    let obj = url_to_obj("https://cdn.pixelbin.io/v2/red-scene-95b6ea/z-slug/wrkr/resize/w200/a.jpeg")
        .unwrap();
    assert_eq!(obj.zone.as_deref(), Some("z-slug"));
    assert_eq!(obj.worker_path(), Some("resize/w200/a.jpeg"));
    assert_eq!(obj.pattern, None);
    assert!(obj.transformations.is_empty());
}

#[test]
fn test_parse_bare_worker_segment_is_rejected() {
    assert!(url_to_obj("https://cdn.pixelbin.io/v2/cloud/wrkr").is_err());

    let obj = url_to_obj("https://cdn.pixelbin.io/v2/cloud/wrkr/").unwrap();
    assert_eq!(obj.target, AssetTarget::Worker(String::new()));
    assert_eq!(obj_to_url(&obj).unwrap(), "https://cdn.pixelbin.io/v2/cloud/wrkr/");
}

#[test]
fn test_build_zoned_url_for_both_versions() {
    let obj = zoned(vec![
        resize(),
        Transformation::operation("erase", "bg").param("i", "general"),
        Transformation::operation("t", "extend"),
        Transformation::preset("preset1"),
    ]);
    assert_eq!(
        obj_to_url(&obj).unwrap(),
        "https://cdn.pixelbin.io/v2/red-scene-95b6ea/z-slug/t.resize(h:200,w:100,fill:999)~erase.bg(i:general)~t.extend()~p:preset1/__playground/playground-default.jpeg"
    );

    let obj = obj.version(Version::V1);
    assert_eq!(
        obj_to_url(&obj).unwrap(),
        "https://cdn.pixelbin.io/v1/red-scene-95b6ea/z-slug/t.resize(h:200,w:100,fill:999)~erase.bg(i:general)~t.extend()~p:preset1/__playground/playground-default.jpeg"
    );
}

#[test]
fn test_build_preset_with_params() {
    let obj = zoned(vec![
        Transformation::operation("t", "extend"),
        Transformation::preset("preset1")
            .param("a", "200")
            .param("b", "1.2")
            .param("c", "test"),
    ]);
    assert_eq!(
        obj_to_url(&obj).unwrap(),
        "https://cdn.pixelbin.io/v2/red-scene-95b6ea/z-slug/t.extend()~p:preset1(a:200,b:1.2,c:test)/__playground/playground-default.jpeg"
    );
}

#[test]
fn test_build_original_when_untransformed() {
    let obj = zoned(Vec::new());
    assert_eq!(
        obj_to_url(&obj).unwrap(),
        "https://cdn.pixelbin.io/v2/red-scene-95b6ea/z-slug/original/__playground/playground-default.jpeg"
    );

    let obj = obj.dpr(Dpr::Value(2.5)).f_auto(true);
    assert_eq!(
        obj_to_url(&obj).unwrap(),
        "https://cdn.pixelbin.io/v2/red-scene-95b6ea/z-slug/original/__playground/playground-default.jpeg?dpr=2.5&f_auto=true"
    );
}

#[test]
fn test_build_rejects_incomplete_params() {
    let missing_key = zoned(vec![Transformation::Operation {
        plugin: "t".to_string(),
        name: "resize".to_string(),
        values: vec![TransformationParam {
            key: String::new(),
            value: Some("1".to_string()),
        }],
    }]);
    let err = obj_to_url(&missing_key).unwrap_err();
    assert!(err.to_string().contains("key not specified"));

    let missing_value = zoned(vec![Transformation::Operation {
        plugin: "t".to_string(),
        name: "resize".to_string(),
        values: vec![TransformationParam {
            key: "h".to_string(),
            value: None,
        }],
    }]);
    let err = obj_to_url(&missing_value).unwrap_err();
    assert!(err.to_string().contains("value not specified for key 'h'"));
}

#[test]
fn test_build_rejects_params_that_would_not_parse_back() {
    let obj = zoned(vec![Transformation::operation("t", "text").param("t", "a,b")]);
    assert!(matches!(
        obj_to_url(&obj),
        Err(PixelbinError::IllegalArgument { .. })
    ));

    let obj = zoned(vec![Transformation::preset("thumb").param("q", "8)0")]);
    assert!(matches!(
        obj_to_url(&obj),
        Err(PixelbinError::IllegalArgument { .. })
    ));
}

#[test]
fn test_build_rejects_out_of_range_dpr() {
    let obj = zoned(Vec::new()).dpr(Dpr::Value(6.0));
    assert!(matches!(
        obj_to_url(&obj),
        Err(PixelbinError::IllegalQueryParameter { .. })
    ));
}

#[test]
fn test_object_json_round_trip() {
    let url = "https://cdn.pixelbin.io/v2/red-scene-95b6ea/z-slug/t.resize(h:200,w:100,fill:999)~p:preset1/__playground/playground-default.jpeg?dpr=auto";
    let obj = url_to_obj(url).unwrap();

    let json = serde_json::to_value(&obj).unwrap();
    assert_eq!(json["cloudName"], "red-scene-95b6ea");
    assert_eq!(json["filePath"], FILE);
    assert_eq!(json["version"], "v2");
    assert_eq!(json["options"]["dpr"], "auto");

    let back: UrlObject = serde_json::from_value(json).unwrap();
    assert_eq!(back, obj);
    assert_eq!(obj_to_url(&back).unwrap(), url);
}
