// Diesel schema for the observations database.

diesel::table! {
    observations (id) {
        id -> BigInt,
        species_name -> Text,
        common_name -> Nullable<Text>,
        observed_on -> Text,
        latitude -> Double,
        longitude -> Double,
        location_description -> Nullable<Text>,
        notes -> Nullable<Text>,
        image_path -> Nullable<Text>,
        category -> Text,
        created_at -> Text,
    }
}
