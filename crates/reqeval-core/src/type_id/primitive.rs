use super::ZoneId;

crate::define_type_zone! {
    /// Primitive and standard library types, available to every request
    pub static PRIMITIVE_ZONE = zone(ZoneId::PRIMITIVE, "Primitive") {
        u8 => UnsignedChar,
        i8 => SignedChar,
        char => Char,
        i16 => Short,
        u16 => UnsignedShort,
        i32 => Int,
        u32 => UnsignedInt,
        i64 => Long,
        u64 => UnsignedLong,
        i128 => LongLong,
        u128 => UnsignedLongLong,
        f32 => Float,
        f64 => Double,
        bool => Bool,
        () => Void,
        String => String,
        usize => Size,
        isize => PtrDiff,
    }
    templates {
        Vec => Vector,
        Option => Optional,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_id::{identity_of, EntryKind, LocalId, TypeIdentified};

    #[test]
    fn test_primitive_zone_order() {
        assert_eq!(identity_of::<u8>().local_id(), LocalId::new(0));
        assert_eq!(identity_of::<i32>().local_id(), LocalId::new(5));
        assert_eq!(identity_of::<f64>().local_id(), LocalId::new(12));
        assert_eq!(identity_of::<String>().local_id(), LocalId::new(15));
        assert_eq!(identity_of::<isize>().local_id(), LocalId::new(17));
    }

    #[test]
    fn test_templates_follow_types() {
        let vector = PRIMITIVE_ZONE.entry(LocalId::new(18));
        assert_eq!(vector.map(|e| (e.name, e.kind)), Some(("Vector", EntryKind::Template)));
        let optional = PRIMITIVE_ZONE.entry(LocalId::new(19));
        assert_eq!(optional.map(|e| e.name), Some("Optional"));
        assert_eq!(PRIMITIVE_ZONE.len(), 20);
    }

    #[test]
    fn test_primitive_names() {
        assert_eq!(<f64 as TypeIdentified>::type_name(), "Double");
        assert_eq!(<() as TypeIdentified>::type_name(), "Void");
        assert_eq!(<Option<String> as TypeIdentified>::type_name(), "Optional<String>");
    }

    #[test]
    fn test_all_primitive_identities_in_zone() {
        for identity in PRIMITIVE_ZONE.identities() {
            assert_eq!(identity.zone(), ZoneId::PRIMITIVE);
        }
        assert_eq!(PRIMITIVE_ZONE.identities().count(), 18);
    }
}
