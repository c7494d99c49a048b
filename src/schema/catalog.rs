//! Built-in entities served by this crate and the path lookup over them.

use super::types::*;
use crate::error::ConfigError;
use std::collections::HashMap;

/// Units accepted for stock items.
pub const STOCK_UNITS: &[&str] = &["kg", "g", "lb", "oz", "l", "ml", "unit", "dozen"];

/// Where orders for a menu sub-category are prepared.
pub const ITEM_TYPES: &[&str] = &["kitchen", "bar"];

const STOCK_CATEGORY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name").required().updatable(),
    FieldSpec::text("description").updatable(),
    FieldSpec::integer("display_order").default(FieldDefault::Integer(0)).at_least(0.0).updatable(),
    FieldSpec::boolean("is_active").default(FieldDefault::Boolean(true)).updatable(),
];

pub static STOCK_CATEGORIES: EntitySchema = EntitySchema {
    name: "stock_categories",
    label: "stock category",
    label_plural: "stock categories",
    path_segment: "stock-categories",
    collection_key: "categories",
    id_column: "id",
    fields: STOCK_CATEGORY_FIELDS,
    parent: None,
    dependents: &[
        Dependent {
            label: "stock sub-categories",
            table: "stock_sub_categories",
            column: "stock_category_id",
            query: "check_stock_category_dependencies",
        },
        Dependent {
            label: "stock items",
            table: "stock_items",
            column: "category_id",
            query: "check_stock_category_item_dependencies",
        },
    ],
    exactly_one_of: &[],
    products: &[],
    queries: QueryNames {
        list: "list_stock_categories",
        count: "count_stock_categories",
        get: "get_stock_category_by_id",
        create: "create_stock_category",
        update: "update_stock_category",
        delete: "delete_stock_category",
    },
};

const STOCK_SUB_CATEGORY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name").required().updatable(),
    FieldSpec::text("description").updatable(),
    FieldSpec::uuid("stock_category_id").required(),
    FieldSpec::integer("display_order").default(FieldDefault::Integer(0)).at_least(0.0).updatable(),
    FieldSpec::boolean("is_active").default(FieldDefault::Boolean(true)).updatable(),
];

pub static STOCK_SUB_CATEGORIES: EntitySchema = EntitySchema {
    name: "stock_sub_categories",
    label: "stock sub-category",
    label_plural: "stock sub-categories",
    path_segment: "sub-categories",
    collection_key: "sub_categories",
    id_column: "id",
    fields: STOCK_SUB_CATEGORY_FIELDS,
    parent: Some(ParentRef {
        param: "category_id",
        column: "stock_category_id",
        kind: FieldKind::Uuid,
    }),
    dependents: &[Dependent {
        label: "stock variants",
        table: "stock_variants",
        column: "stock_sub_category_id",
        query: "check_stock_sub_category_dependencies",
    }],
    exactly_one_of: &[],
    products: &[],
    queries: QueryNames {
        list: "list_stock_sub_categories",
        count: "count_stock_sub_categories",
        get: "get_stock_sub_category_by_id",
        create: "create_stock_sub_category",
        update: "update_stock_sub_category",
        delete: "delete_stock_sub_category",
    },
};

const STOCK_VARIANT_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name").required().updatable(),
    FieldSpec::uuid("stock_sub_category_id").required(),
    FieldSpec::uuid("invoice_id"),
    FieldSpec::text("unit").required().updatable(),
    FieldSpec::number("number_of_units").required().at_least(0.0).updatable(),
    FieldSpec::boolean("is_active").default(FieldDefault::Boolean(true)).updatable(),
];

pub static STOCK_VARIANTS: EntitySchema = EntitySchema {
    name: "stock_variants",
    label: "stock variant",
    label_plural: "stock variants",
    path_segment: "stock-variants",
    collection_key: "variants",
    id_column: "id",
    fields: STOCK_VARIANT_FIELDS,
    parent: Some(ParentRef {
        param: "sub_category_id",
        column: "stock_sub_category_id",
        kind: FieldKind::Uuid,
    }),
    dependents: &[
        Dependent {
            label: "menu ingredients",
            table: "menu_ingredients",
            column: "stock_variant_id",
            query: "check_stock_variant_dependencies",
        },
        Dependent {
            label: "stock counts",
            table: "stock_count",
            column: "stock_variant_id",
            query: "check_stock_variant_count_dependencies",
        },
    ],
    exactly_one_of: &[],
    products: &[],
    queries: QueryNames {
        list: "list_stock_variants",
        count: "count_stock_variants",
        get: "get_stock_variant_by_id",
        create: "create_stock_variant",
        update: "update_stock_variant",
        delete: "delete_stock_variant",
    },
};

const STOCK_ITEM_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name").required().updatable(),
    FieldSpec::text("unit").required().one_of(STOCK_UNITS).updatable(),
    FieldSpec::text("description").updatable(),
    FieldSpec::uuid("category_id").updatable(),
    FieldSpec::number("unit_cost").at_least(0.0).updatable(),
];

pub static STOCK_ITEMS: EntitySchema = EntitySchema {
    name: "stock_items",
    label: "stock item",
    label_plural: "stock items",
    path_segment: "stock-items",
    collection_key: "items",
    id_column: "id",
    fields: STOCK_ITEM_FIELDS,
    parent: Some(ParentRef {
        param: "category_id",
        column: "category_id",
        kind: FieldKind::Uuid,
    }),
    dependents: &[Dependent {
        label: "existences",
        table: "existences",
        column: "stock_item_id",
        query: "check_stock_item_dependencies",
    }],
    exactly_one_of: &[],
    products: &[],
    queries: QueryNames {
        list: "list_stock_items",
        count: "count_stock_items",
        get: "get_stock_item_by_id",
        create: "create_stock_item",
        update: "update_stock_item",
        delete: "delete_stock_item",
    },
};

const EXISTENCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::uuid("stock_item_id").required(),
    FieldSpec::uuid("invoice_detail_id").required(),
    FieldSpec::number("units_purchased").required().at_least(0.0),
    FieldSpec::number("cost_per_unit").required().at_least(0.0),
    FieldSpec::number("current_stock").at_least(0.0).updatable(),
    FieldSpec::timestamp("expiry_date").updatable(),
    FieldSpec::text("batch_number").updatable(),
];

pub static EXISTENCES: EntitySchema = EntitySchema {
    name: "existences",
    label: "existence",
    label_plural: "existences",
    path_segment: "existences",
    collection_key: "existences",
    id_column: "id",
    fields: EXISTENCE_FIELDS,
    parent: Some(ParentRef {
        param: "stock_item_id",
        column: "stock_item_id",
        kind: FieldKind::Uuid,
    }),
    dependents: &[],
    exactly_one_of: &[],
    products: &[("units_purchased", "cost_per_unit")],
    queries: QueryNames {
        list: "list_existences",
        count: "count_existences",
        get: "get_existence_by_id",
        create: "create_existence",
        update: "update_existence",
        delete: "delete_existence",
    },
};

/// Units a stock count may be recorded in.
pub const COUNT_UNITS: &[&str] = &["kg", "g", "l", "ml"];

const STOCK_COUNT_FIELDS: &[FieldSpec] = &[
    FieldSpec::uuid("stock_variant_id").required(),
    FieldSpec::uuid("invoice_id"),
    FieldSpec::number("count").required().at_least(0.0).updatable(),
    FieldSpec::text("unit").required().one_of(COUNT_UNITS).updatable(),
    FieldSpec::number("unit_price").at_least(0.0).updatable(),
    FieldSpec::timestamp("purchased_at").required(),
    // Set when the counted stock has run out.
    FieldSpec::boolean("is_out").default(FieldDefault::Boolean(false)).updatable(),
];

pub static STOCK_COUNTS: EntitySchema = EntitySchema {
    name: "stock_count",
    label: "stock count",
    label_plural: "stock counts",
    path_segment: "stock-counts",
    collection_key: "stock_counts",
    id_column: "id",
    fields: STOCK_COUNT_FIELDS,
    parent: Some(ParentRef {
        param: "stock_variant_id",
        column: "stock_variant_id",
        kind: FieldKind::Uuid,
    }),
    dependents: &[],
    exactly_one_of: &[],
    products: &[],
    queries: QueryNames {
        list: "list_stock_counts",
        count: "count_stock_counts",
        get: "get_stock_count_by_id",
        create: "create_stock_count",
        update: "update_stock_count",
        delete: "delete_stock_count",
    },
};

const MENU_CATEGORY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name").required().updatable(),
    FieldSpec::text("description").updatable(),
    FieldSpec::integer("display_order").default(FieldDefault::Integer(0)).at_least(0.0).updatable(),
];

pub static MENU_CATEGORIES: EntitySchema = EntitySchema {
    name: "menu_categories",
    label: "menu category",
    label_plural: "menu categories",
    path_segment: "menu-categories",
    collection_key: "categories",
    id_column: "id",
    fields: MENU_CATEGORY_FIELDS,
    parent: None,
    dependents: &[Dependent {
        label: "menu sub-categories",
        table: "menu_sub_categories",
        column: "category_id",
        query: "check_menu_category_dependencies",
    }],
    exactly_one_of: &[],
    products: &[],
    queries: QueryNames {
        list: "list_menu_categories",
        count: "count_menu_categories",
        get: "get_menu_category_by_id",
        create: "create_menu_category",
        update: "update_menu_category",
        delete: "delete_menu_category",
    },
};

const MENU_SUB_CATEGORY_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name").required().updatable(),
    FieldSpec::text("description").updatable(),
    FieldSpec::uuid("category_id").required(),
    FieldSpec::text("item_type").required().one_of(ITEM_TYPES).updatable(),
    FieldSpec::integer("display_order").default(FieldDefault::Integer(0)).at_least(0.0).updatable(),
    FieldSpec::boolean("is_active").default(FieldDefault::Boolean(true)).updatable(),
];

pub static MENU_SUB_CATEGORIES: EntitySchema = EntitySchema {
    name: "menu_sub_categories",
    label: "menu sub-category",
    label_plural: "menu sub-categories",
    path_segment: "menu-sub-categories",
    collection_key: "sub_categories",
    id_column: "id",
    fields: MENU_SUB_CATEGORY_FIELDS,
    parent: Some(ParentRef {
        param: "category_id",
        column: "category_id",
        kind: FieldKind::Uuid,
    }),
    dependents: &[
        Dependent {
            label: "menu variants",
            table: "menu_variants",
            column: "sub_category_id",
            query: "check_menu_sub_category_dependencies",
        },
        Dependent {
            label: "menu ingredients",
            table: "menu_ingredients",
            column: "menu_sub_category_id",
            query: "check_menu_sub_category_ingredient_dependencies",
        },
    ],
    exactly_one_of: &[],
    products: &[],
    queries: QueryNames {
        list: "list_menu_sub_categories",
        count: "count_menu_sub_categories",
        get: "get_menu_sub_category_by_id",
        create: "create_menu_sub_category",
        update: "update_menu_sub_category",
        delete: "delete_menu_sub_category",
    },
};

const MENU_VARIANT_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name").required().updatable(),
    FieldSpec::text("description").updatable(),
    FieldSpec::uuid("sub_category_id").required(),
    FieldSpec::number("price").required().at_least(0.0).updatable(),
    FieldSpec::number("item_cost").at_least(0.0).updatable(),
    FieldSpec::number("happy_hour_price").at_least(0.0).updatable(),
    FieldSpec::text("image_url").updatable(),
    FieldSpec::boolean("is_available").default(FieldDefault::Boolean(true)).updatable(),
    // Minutes.
    FieldSpec::integer("preparation_time").at_least(0.0).updatable(),
    FieldSpec::boolean("is_alcoholic").default(FieldDefault::Boolean(false)).updatable(),
    FieldSpec::integer("display_order").default(FieldDefault::Integer(0)).at_least(0.0).updatable(),
];

pub static MENU_VARIANTS: EntitySchema = EntitySchema {
    name: "menu_variants",
    label: "menu variant",
    label_plural: "menu variants",
    path_segment: "menu-variants",
    collection_key: "items",
    id_column: "id",
    fields: MENU_VARIANT_FIELDS,
    parent: Some(ParentRef {
        param: "sub_category_id",
        column: "sub_category_id",
        kind: FieldKind::Uuid,
    }),
    dependents: &[Dependent {
        label: "menu ingredients",
        table: "menu_ingredients",
        column: "menu_variant_id",
        query: "check_menu_variant_dependencies",
    }],
    exactly_one_of: &[],
    products: &[],
    queries: QueryNames {
        list: "list_menu_variants",
        count: "count_menu_variants",
        get: "get_menu_variant_by_id",
        create: "create_menu_variant",
        update: "update_menu_variant",
        delete: "delete_menu_variant",
    },
};

const MENU_INGREDIENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::uuid("menu_variant_id").required(),
    FieldSpec::uuid("stock_variant_id"),
    FieldSpec::uuid("menu_sub_category_id"),
    FieldSpec::number("quantity").required().at_least(0.0).updatable(),
    FieldSpec::boolean("is_optional").default(FieldDefault::Boolean(false)).updatable(),
    FieldSpec::text("notes").updatable(),
];

pub static MENU_INGREDIENTS: EntitySchema = EntitySchema {
    name: "menu_ingredients",
    label: "menu ingredient",
    label_plural: "menu ingredients",
    path_segment: "menu-ingredients",
    collection_key: "ingredients",
    id_column: "id",
    fields: MENU_INGREDIENT_FIELDS,
    parent: Some(ParentRef {
        param: "menu_variant_id",
        column: "menu_variant_id",
        kind: FieldKind::Uuid,
    }),
    dependents: &[],
    exactly_one_of: &[&["stock_variant_id", "menu_sub_category_id"]],
    products: &[],
    queries: QueryNames {
        list: "list_menu_ingredients",
        count: "count_menu_ingredients",
        get: "get_menu_ingredient_by_id",
        create: "create_menu_ingredient",
        update: "update_menu_ingredient",
        delete: "delete_menu_ingredient",
    },
};

const SETTING_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("service").required(),
    FieldSpec::text("key").required(),
    FieldSpec::text("value").required().updatable(),
    FieldSpec::text("description").default(FieldDefault::Text("")).updatable(),
];

pub static SETTINGS: EntitySchema = EntitySchema {
    name: "settings",
    label: "setting",
    label_plural: "settings",
    path_segment: "settings",
    collection_key: "settings",
    id_column: "setting_id",
    fields: SETTING_FIELDS,
    parent: Some(ParentRef {
        param: "service",
        column: "service",
        kind: FieldKind::Text,
    }),
    dependents: &[],
    exactly_one_of: &[],
    products: &[],
    queries: QueryNames {
        list: "list_settings",
        count: "count_settings",
        get: "get_setting_by_id",
        create: "create_setting",
        update: "update_setting",
        delete: "delete_setting",
    },
};

/// Entities addressable by path segment.
#[derive(Debug)]
pub struct Catalog {
    entities: Vec<&'static EntitySchema>,
    by_path: HashMap<&'static str, &'static EntitySchema>,
}

impl Catalog {
    pub fn new(entities: Vec<&'static EntitySchema>) -> Result<Self, ConfigError> {
        let mut by_path = HashMap::with_capacity(entities.len());
        for entity in &entities {
            if by_path.insert(entity.path_segment, *entity).is_some() {
                return Err(ConfigError::DuplicatePathSegment(entity.path_segment.to_string()));
            }
        }
        Ok(Catalog { entities, by_path })
    }

    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(vec![
            &STOCK_CATEGORIES,
            &STOCK_SUB_CATEGORIES,
            &STOCK_VARIANTS,
            &STOCK_ITEMS,
            &EXISTENCES,
            &STOCK_COUNTS,
            &MENU_CATEGORIES,
            &MENU_SUB_CATEGORIES,
            &MENU_VARIANTS,
            &MENU_INGREDIENTS,
            &SETTINGS,
        ])
    }

    pub fn by_path(&self, path_segment: &str) -> Option<&'static EntitySchema> {
        self.by_path.get(path_segment).copied()
    }

    pub fn entities(&self) -> &[&'static EntitySchema] {
        &self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_paths_resolve() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.entities().len(), 11);
        let sub = catalog.by_path("sub-categories").unwrap();
        assert_eq!(sub.name, "stock_sub_categories");
        assert_eq!(sub.parent.map(|p| p.param), Some("category_id"));
        let menu_sub = catalog.by_path("menu-sub-categories").unwrap();
        assert_eq!(menu_sub.parent.map(|p| p.column), Some("category_id"));
        assert_eq!(menu_sub.dependents.len(), 2);
        assert!(catalog.by_path("suppliers").is_none());
    }

    #[test]
    fn duplicate_path_segments_are_rejected() {
        let err = Catalog::new(vec![&SETTINGS, &SETTINGS]).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePathSegment(p) if p == "settings"));
    }

    #[test]
    fn required_fields_have_no_defaults() {
        let catalog = Catalog::builtin().unwrap();
        for entity in catalog.entities() {
            for field in entity.fields {
                assert!(
                    !(field.required && field.default.is_some()),
                    "{}.{} is both required and defaulted",
                    entity.name,
                    field.name
                );
            }
        }
    }

    #[test]
    fn menu_ingredient_references_resolve_to_entities() {
        let catalog = Catalog::builtin().unwrap();
        let tables: Vec<&str> = catalog.entities().iter().map(|e| e.name).collect();
        for dependent in MENU_SUB_CATEGORIES.dependents.iter().chain(MENU_VARIANTS.dependents) {
            assert!(tables.contains(&dependent.table), "{} is not catalogued", dependent.table);
        }
        assert!(MENU_INGREDIENTS.field("menu_variant_id").is_some());
        assert!(MENU_INGREDIENTS.field("menu_sub_category_id").is_some());
    }

    #[test]
    fn parent_columns_are_create_fields() {
        let catalog = Catalog::builtin().unwrap();
        for entity in catalog.entities() {
            if let Some(parent) = entity.parent {
                let field = entity.field(parent.column).unwrap_or_else(|| panic!("{} parent column", entity.name));
                assert_eq!(field.kind, parent.kind);
            }
        }
    }
}
