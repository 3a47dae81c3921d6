use proptest::prelude::*;

use grove::core::{make_dynamic_group_id, make_group_id};

proptest! {
    #[test]
    fn group_id_is_stable(name in ".*") {
        prop_assert_eq!(make_group_id(&name), make_group_id(&name));
    }

    #[test]
    fn distinct_names_get_distinct_ids(a in "[a-zA-Z0-9 _-]{1,24}", b in "[a-zA-Z0-9 _-]{1,24}") {
        prop_assume!(a != b);
        prop_assert_ne!(make_group_id(&a), make_group_id(&b));
    }

    #[test]
    fn dynamic_ids_never_shadow_user_ids(name in ".{1,32}") {
        prop_assert_ne!(make_group_id(&name), make_dynamic_group_id(&name));
    }

    #[test]
    fn id_is_a_hyphenated_uuid(name in ".*") {
        let id = make_group_id(&name);
        prop_assert_eq!(id.as_str().len(), 36);
        prop_assert_eq!(id.as_str().matches('-').count(), 4);
    }
}
