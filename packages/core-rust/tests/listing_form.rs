//! End-to-end behavior of the listing form: render, edit, validate, save and
//! reload, driven through the public API only.

use bazaar_core::overrides::{
    BATTERY_HEALTH, CONSOLE_MODEL, CONTROLLER_COUNT, MAX_PLAYERS, MIN_PLAYERS, PURCHASE_YEAR,
    SCREEN_CONDITION, STICK_DRIFT, STORAGE, USAGE_LEVEL, WARRANTY_STATUS,
};
use bazaar_core::{
    render_form, serialize_attributes, validate_attributes, AttributeMap, AttributeValue, Effect,
    FieldInput, FieldType, FormEvent, FormValues, Listing, ListingFormState, LoadedSchema,
    OverridePlan, SchemaField,
};
use proptest::prelude::*;
use serde_json::json;

fn field(key: &str, label: &str, field_type: FieldType, required: bool) -> SchemaField {
    SchemaField {
        key: key.into(),
        label: label.into(),
        field_type,
        required,
        ..SchemaField::default()
    }
}

fn text(s: &str) -> AttributeValue {
    AttributeValue::Text(s.into())
}

fn loaded(fields: Vec<SchemaField>) -> LoadedSchema {
    LoadedSchema {
        exists: true,
        version: 1,
        fields,
    }
}

/// Opens the form on a category and answers its schema request.
fn open(state: &mut ListingFormState, category: &str, schema: LoadedSchema) {
    let effect = state.apply(FormEvent::CategoryChanged {
        category_id: category.into(),
        slug: category.into(),
    });
    let Some(Effect::LoadSchema { generation, .. }) = effect else {
        panic!("category change must request a schema");
    };
    state.apply(FormEvent::SchemaLoaded { generation, schema });
}

fn stored_listing(category: &str, sub: Option<&str>, attributes: AttributeMap) -> Listing {
    Listing {
        id: "listing-1".into(),
        owner_id: "owner-1".into(),
        title: "İlan".into(),
        description: String::new(),
        price: 100.0,
        category_id: category.into(),
        sub_category_id: sub.map(str::to_string),
        image_urls: vec![],
        attributes,
        schema_version: Some(1),
        created_at_ms: 1,
        updated_at_ms: 1,
    }
}

fn reopen(listing: Listing, schema: LoadedSchema) -> ListingFormState {
    let mut state = ListingFormState::new();
    let Some(Effect::LoadSchema { generation, .. }) =
        state.apply(FormEvent::LoadedForEdit { listing })
    else {
        panic!("loading for edit must request a schema");
    };
    state.apply(FormEvent::SchemaLoaded { generation, schema });
    state
}

#[test]
fn filled_required_fields_submit_and_blank_optionals_are_omitted() {
    let mut state = ListingFormState::new();
    open(
        &mut state,
        "koleksiyon",
        loaded(vec![
            field("brand", "Marka", FieldType::Text, true),
            field("pieces", "Parça", FieldType::Number, true),
            field("sealed", "Kapalı kutu", FieldType::Boolean, false),
            field("notes", "Notlar", FieldType::Text, false),
            field("year", "Yıl", FieldType::Number, false),
        ]),
    );
    assert!(state.plan().fields().is_empty());
    assert_eq!(state.controls().len(), 5);

    state.apply(FormEvent::AttributeEdited {
        key: "brand".into(),
        raw: text("Lego"),
    });
    state.apply(FormEvent::AttributeEdited {
        key: "pieces".into(),
        raw: text("500"),
    });
    state.apply(FormEvent::AttributeEdited {
        key: "notes".into(),
        raw: text(""),
    });

    assert_eq!(state.validate(), Ok(()));
    let attrs = state.attributes();
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs["brand"], text("Lego"));
    assert_eq!(attrs["pieces"], AttributeValue::Number(500.0));
    assert_eq!(
        serde_json::to_value(&attrs).unwrap(),
        json!({"brand": "Lego", "pieces": 500})
    );
}

#[test]
fn unset_required_boolean_fails_but_false_passes() {
    let fields = vec![field("original", "Orijinal", FieldType::Boolean, true)];
    let plan = OverridePlan::none();
    let skip = plan.skip_keys();

    let mut values = FormValues::new();
    let err = validate_attributes(&values, &fields, &skip).unwrap_err();
    assert_eq!(err.message(), "Orijinal alanı zorunludur.");

    values.set("original", FieldInput::boolean(false));
    assert_eq!(validate_attributes(&values, &fields, &skip), Ok(()));
    assert_eq!(
        serialize_attributes(&values, &fields, &plan)["original"],
        AttributeValue::Bool(false)
    );
}

#[test]
fn numeric_bounds_are_inclusive_and_errors_name_the_field() {
    let fields = vec![SchemaField {
        min: Some(2.0),
        max: Some(10.0),
        ..field("players", "Oyuncu sayısı", FieldType::Number, true)
    }];
    let skip = OverridePlan::none().skip_keys();
    let check = |n: f64| {
        let mut values = FormValues::new();
        values.set("players", FieldInput::number(n));
        validate_attributes(&values, &fields, &skip)
    };

    assert!(check(2.0).is_ok());
    assert!(check(10.0).is_ok());
    let below = check(1.0).unwrap_err();
    assert!(below.message().contains("Oyuncu sayısı"), "{below}");
    let above = check(11.0).unwrap_err();
    assert!(above.message().contains("Oyuncu sayısı"), "{above}");
}

#[test]
fn override_attributes_round_trip_through_modern_keys() {
    let mut state = ListingFormState::new();
    open(&mut state, "kutu-oyunlari", LoadedSchema::absent());
    state.apply(FormEvent::AttributeEdited {
        key: MIN_PLAYERS.into(),
        raw: text("2"),
    });
    state.apply(FormEvent::AttributeEdited {
        key: MAX_PLAYERS.into(),
        raw: text("4"),
    });
    assert_eq!(state.validate(), Ok(()));
    let saved = state.attributes();

    let reloaded = reopen(
        stored_listing("kutu-oyunlari", None, saved.clone()),
        LoadedSchema::absent(),
    );
    assert_eq!(
        reloaded.values().value(MIN_PLAYERS).and_then(AttributeValue::as_number),
        Some(2.0)
    );
    assert_eq!(
        reloaded.values().value(MAX_PLAYERS).and_then(AttributeValue::as_number),
        Some(4.0)
    );
    assert_eq!(reloaded.attributes(), saved);
}

#[test]
fn legacy_players_min_loads_into_modern_key_and_is_not_resaved() {
    let mut stored = AttributeMap::new();
    stored.insert("playersMin".into(), AttributeValue::Number(2.0));
    stored.insert(MAX_PLAYERS.into(), AttributeValue::Number(5.0));

    let state = reopen(
        stored_listing("kutu-oyunlari", None, stored),
        LoadedSchema::absent(),
    );
    assert_eq!(
        state.values().value(MIN_PLAYERS),
        Some(&AttributeValue::Number(2.0))
    );

    let resaved = state.attributes();
    assert_eq!(resaved.get(MIN_PLAYERS), Some(&AttributeValue::Number(2.0)));
    assert!(!resaved.contains_key("playersMin"));
}

#[test]
fn parts_sub_category_hides_and_resets_console_detail_fields() {
    let mut state = ListingFormState::new();
    open(&mut state, "konsollar", LoadedSchema::absent());
    state.apply(FormEvent::SubCategoryChanged {
        sub_category_id: Some("konsollar__playstation".into()),
    });
    for (key, raw) in [
        (CONSOLE_MODEL, "PS5"),
        (STORAGE, "825 GB"),
        (CONTROLLER_COUNT, "2"),
        (PURCHASE_YEAR, "2022"),
        (WARRANTY_STATUS, "Garantili"),
        (USAGE_LEVEL, "Orta"),
    ] {
        state.apply(FormEvent::AttributeEdited {
            key: key.into(),
            raw: text(raw),
        });
    }
    assert_eq!(state.attributes().len(), 6);

    state.apply(FormEvent::SubCategoryChanged {
        sub_category_id: Some("konsollar__parca-servis".into()),
    });

    let hidden = [STORAGE, CONTROLLER_COUNT, PURCHASE_YEAR, WARRANTY_STATUS, USAGE_LEVEL];
    let rendered: Vec<String> = state.controls().into_iter().map(|c| c.key).collect();
    for key in hidden {
        assert!(!state.plan().is_visible(key), "{key} should be hidden");
        assert!(!rendered.iter().any(|k| k == key), "{key} should not render");
        assert_eq!(state.values().get(key), &FieldInput::Unset, "{key} should reset");
    }
    let attrs = state.attributes();
    assert!(hidden.iter().all(|k| !attrs.contains_key(*k)));

    // Switching back does not resurrect the cleared values.
    state.apply(FormEvent::SubCategoryChanged {
        sub_category_id: Some("konsollar__playstation".into()),
    });
    assert!(state.attributes().get(STORAGE).is_none());
}

#[test]
fn switch_lite_under_consoles_reveals_handheld_fields() {
    let plan = OverridePlan::resolve("konsollar", Some("konsollar__handheld"), Some("Switch Lite"));
    let visibility = plan.console_visibility();
    assert!(visibility.battery_health);
    assert!(visibility.screen_condition);
    assert!(visibility.stick_drift);

    let keys: Vec<String> = render_form(&[], &plan, &FormValues::new())
        .into_iter()
        .map(|c| c.key)
        .collect();
    for key in [BATTERY_HEALTH, SCREEN_CONDITION, STICK_DRIFT] {
        assert!(keys.iter().any(|k| k == key), "{key} should render");
    }

    let as_json = serde_json::to_value(visibility).unwrap();
    assert_eq!(as_json["batteryHealth"], true);
    assert_eq!(as_json["screenCondition"], true);
    assert_eq!(as_json["stickDrift"], true);
}

proptest! {
    #[test]
    fn optional_blanks_never_reach_the_payload(
        required in proptest::collection::vec(any::<bool>(), 1..8),
        filled in proptest::collection::vec(any::<bool>(), 8),
    ) {
        let fields: Vec<SchemaField> = required
            .iter()
            .enumerate()
            .map(|(i, req)| field(&format!("f{i}"), &format!("Alan {i}"), FieldType::Text, *req))
            .collect();
        let mut values = FormValues::new();
        for (i, f) in fields.iter().enumerate() {
            if f.required || filled[i] {
                values.set(f.key.clone(), FieldInput::text(format!("v{i}")));
            } else {
                values.set(f.key.clone(), FieldInput::Empty);
            }
        }

        let plan = OverridePlan::none();
        prop_assert!(validate_attributes(&values, &fields, &plan.skip_keys()).is_ok());
        let attrs = serialize_attributes(&values, &fields, &plan);
        for (i, f) in fields.iter().enumerate() {
            prop_assert_eq!(attrs.contains_key(&f.key), f.required || filled[i]);
        }
    }
}
