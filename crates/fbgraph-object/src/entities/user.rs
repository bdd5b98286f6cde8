//! Facebook users.

use crate::factory::EntityType;
use crate::record::EntityRecord;
use crate::schema::{ConnectionDefinition, EntitySchema, FieldDefinition, FieldType, Permission};

/// Schema of the `User` node.
pub static USER: EntitySchema = EntitySchema::new(
    "User",
    "The user's Facebook ID",
    &[
        FieldDefinition::new("name", FieldType::String, "The user's full name"),
        FieldDefinition::new("first_name", FieldType::String, "The user's first name"),
        FieldDefinition::new("middle_name", FieldType::String, "The user's middle name"),
        FieldDefinition::new("last_name", FieldType::String, "The user's last name"),
        FieldDefinition::new("gender", FieldType::String, "The user's gender (male or female)"),
        FieldDefinition::new("locale", FieldType::String, "The user's locale"),
        FieldDefinition::new("languages", FieldType::Array, "The user's languages")
            .permission(Permission::Named("user_likes")),
        FieldDefinition::new("link", FieldType::String, "The URL of the profile for the user on Facebook"),
        FieldDefinition::new("username", FieldType::String, "The user's Facebook username"),
        FieldDefinition::new("age_range", FieldType::Object, "The user's age range")
            .permission(Permission::User)
            .must_ask(),
        FieldDefinition::new("third_party_id", FieldType::String, "An anonymous, but unique identifier for the user")
            .permission(Permission::User)
            .must_ask(),
        FieldDefinition::new("installed", FieldType::Object, "Specifies whether the user has installed the application associated with the app access token that is used to make the request")
            .permission(Permission::App)
            .must_ask(),
        FieldDefinition::new("timezone", FieldType::Float, "The user's timezone offset from UTC"),
        FieldDefinition::new("updated_time", FieldType::String, "The last time the user's profile was updated")
            .permission(Permission::User),
        FieldDefinition::new("verified", FieldType::Boolean, "The user's account verification status, either true or false")
            .permission(Permission::User),
        FieldDefinition::new("bio", FieldType::String, "The user's biography")
            .permission(Permission::Named("user_about_me,friends_about_me")),
        FieldDefinition::new("birthday", FieldType::String, "The user's birthday")
            .permission(Permission::Named("user_birthday,friends_birthday")),
        FieldDefinition::new("cover", FieldType::Array, "The user's cover photo")
            .permission(Permission::User)
            .must_ask(),
        FieldDefinition::new("currency", FieldType::Object, "The user's currency settings")
            .permission(Permission::User)
            .must_ask(),
        FieldDefinition::new("devices", FieldType::Array, "A list of the user's devices beyond desktop")
            .permission(Permission::User)
            .must_ask(),
        FieldDefinition::new("education", FieldType::Array, "A list of the user's education history")
            .permission(Permission::Named("user_education_history,friends_education_history")),
        FieldDefinition::new("email", FieldType::String, "The proxied or contact email address granted by the user")
            .permission(Permission::Named("email")),
        FieldDefinition::new("hometown", FieldType::Object, "The user's hometown")
            .permission(Permission::Named("user_hometown,friends_hometown")),
        FieldDefinition::new("interested_in", FieldType::Array, "The genders the user is interested in")
            .permission(Permission::Named("user_relationship_details,friends_relationship_details")),
        FieldDefinition::new("location", FieldType::Object, "The user's current city")
            .permission(Permission::Named("user_location,friends_location")),
        FieldDefinition::new("political", FieldType::String, "The user's political view")
            .permission(Permission::Named("user_religion_politics,friends_religion_politics")),
        FieldDefinition::new("payment_pricepoints", FieldType::Array, "The mobile payment price-points available for that user, for use when processing payments using Facebook Credits")
            .permission(Permission::User),
        FieldDefinition::new("payment_mobile_pricepoints", FieldType::Object, "The mobile payment price-points available for that user, for use when processing payments using Local Currency")
            .permission(Permission::User),
        FieldDefinition::new("favorite_athletes", FieldType::Array, "The user's favorite athletes; this field is deprecated and will be removed in the near future")
            .permission(Permission::Named("user_likes,friends_likes")),
        FieldDefinition::new("favorite_teams", FieldType::Array, "The user's favorite teams; this field is deprecated and will be removed in the near future")
            .permission(Permission::Named("user_likes,friends_likes")),
        FieldDefinition::new("picture", FieldType::Object, "The user's profile pic")
            .must_ask(),
        FieldDefinition::new("quotes", FieldType::String, "The user's favourite quotes")
            .permission(Permission::Named("user_about_me,friends_about_me")),
        FieldDefinition::new("relationship_status", FieldType::String, "The user's relationship status: Single, In a relationship, Engaged, Married, It's complicated, In an open relationship, Widowed, Separated, Divorced, In a civil union, In a domestic partnership")
            .permission(Permission::Named("user_relationships,friends_relationships")),
        FieldDefinition::new("religion", FieldType::String, "The user's religion")
            .permission(Permission::Named("user_religion_politics,friends_religion_politics")),
        FieldDefinition::new("security_settings", FieldType::Object, "Information about security settings enabled on the user's account")
            .must_ask(),
        FieldDefinition::new("significant_other", FieldType::Object, "The user's significant other")
            .permission(Permission::Named("user_relationships,friends_relationships")),
        FieldDefinition::new("video_upload_limits", FieldType::Object, "The size of the video file and the length of the video that a user can upload")
            .permission(Permission::User)
            .must_ask(),
        FieldDefinition::new("website", FieldType::String, "The URL of the user's personal website")
            .permission(Permission::Named("user_website,friends_website")),
        FieldDefinition::new("work", FieldType::Array, "A list of the user's work history")
            .permission(Permission::Named("user_work_history,friends_work_history")),
    ],
    &[
        ConnectionDefinition::new("accounts", "The Facebook pages of which the current user is an administrator", Permission::Named("manage_pages")),
        ConnectionDefinition::new("adaccounts", "The Facebook Addvertising accounts to which the current user has access.", Permission::Named("ads_management")),
        ConnectionDefinition::new("achievements", "The achievements for the user.", Permission::Named("user_games_activity,friends_games_activity")),
        ConnectionDefinition::new("activities", "The activities listed on the user's profile.", Permission::Named("user_activities,friends_activities")),
        ConnectionDefinition::new("albums", "The photo albums this user has created.", Permission::Named("user_photos,friends_photos")),
        ConnectionDefinition::new("apprequests", "The user's outstanding requests from an app.", Permission::App),
        ConnectionDefinition::new("books", "The books listed on the user's profile.", Permission::Named("user_likes,friends_likes")),
        ConnectionDefinition::new("checkins", "The places that the user has checked-into.", Permission::Named("user_checkins,friends_checkins")),
        ConnectionDefinition::new("events", "The events this user is attending.", Permission::Named("user_events,friends_events")),
        ConnectionDefinition::new("family", "The user's family relationships", Permission::Named("user_relationships")),
        ConnectionDefinition::new("feed", "The user's wall.", Permission::Named("read_stream")),
        ConnectionDefinition::new("friendlists", "The user's friend lists.", Permission::Named("read_friendlists")),
        ConnectionDefinition::new("friendrequests", "The user's incoming friend requests.", Permission::Named("user_requests")),
        ConnectionDefinition::new("friends", "The user's friends.", Permission::User),
        ConnectionDefinition::new("games", "Games the user has added to the Arts and Entertainment section of their profile.", Permission::Named("user_likes")),
    ],
);

/// A user profile.
#[derive(Debug, Clone)]
pub struct User {
    record: EntityRecord,
}

impl User {
    /// An empty user
    pub fn new() -> Self {
        Self::from_record(EntityRecord::new(&USER))
    }

    fn from_record(record: EntityRecord) -> Self {
        Self { record }
    }

    typed_accessors! {
        "id" => id, set_id: str;
        "name" => name, set_name: str;
        "first_name" => first_name, set_first_name: str;
        "middle_name" => middle_name, set_middle_name: str;
        "last_name" => last_name, set_last_name: str;
        "gender" => gender, set_gender: str;
        "locale" => locale, set_locale: str;
        "languages" => languages, set_languages: array;
        "link" => link, set_link: str;
        "username" => username, set_username: str;
        "age_range" => age_range, set_age_range: object;
        "third_party_id" => third_party_id, set_third_party_id: str;
        "installed" => installed, set_installed: object;
        "timezone" => timezone, set_timezone: float;
        "updated_time" => updated_time, set_updated_time: str;
        "verified" => verified, set_verified: bool;
        "bio" => bio, set_bio: str;
        "birthday" => birthday, set_birthday: str;
        "cover" => cover, set_cover: array;
        "currency" => currency, set_currency: object;
        "devices" => devices, set_devices: array;
        "education" => education, set_education: array;
        "email" => email, set_email: str;
        "hometown" => hometown, set_hometown: object;
        "interested_in" => interested_in, set_interested_in: array;
        "location" => location, set_location: object;
        "political" => political, set_political: str;
        "payment_pricepoints" => payment_pricepoints, set_payment_pricepoints: array;
        "payment_mobile_pricepoints" => payment_mobile_pricepoints, set_payment_mobile_pricepoints: object;
        "favorite_athletes" => favorite_athletes, set_favorite_athletes: array;
        "favorite_teams" => favorite_teams, set_favorite_teams: array;
        "picture" => picture, set_picture: object;
        "quotes" => quotes, set_quotes: str;
        "relationship_status" => relationship_status, set_relationship_status: str;
        "religion" => religion, set_religion: str;
        "security_settings" => security_settings, set_security_settings: object;
        "significant_other" => significant_other, set_significant_other: object;
        "video_upload_limits" => video_upload_limits, set_video_upload_limits: object;
        "website" => website, set_website: str;
        "work" => work, set_work: array;
    }

    /// `first_name last_name`, falling back to `name`.
    pub fn display_name(&self) -> Option<String> {
        match (self.first_name(), self.last_name()) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            _ => self.name().map(str::to_owned),
        }
    }
}

impl Default for User {
    fn default() -> Self {
        Self::new()
    }
}

entity_record!(User, USER, EntityType::User);
