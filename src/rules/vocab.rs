//! Controlled vocabularies shared by every rule set.
//!
//! All tables are sorted so membership is a binary search; the tests at the bottom
//! keep them that way.

/// ISO 3166-1 alpha-2 codes accepted by ERN 4.3, plus `Worldwide`.
pub const TERRITORY_CODES_43: &[&str] = &[
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AQ", "AR", "AS", "AT", "AU", "AW", "AX",
    "AZ", "BA", "BB", "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ",
    "BR", "BS", "BT", "BV", "BW", "BY", "BZ", "CA", "CC", "CD", "CF", "CG", "CH", "CI", "CK",
    "CL", "CM", "CN", "CO", "CR", "CU", "CV", "CW", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM",
    "DO", "DZ", "EC", "EE", "EG", "EH", "ER", "ES", "ES-CE", "ES-CN", "ES-ML", "ET", "FI", "FJ",
    "FK", "FM", "FO", "FR", "GA", "GB", "GD", "GE", "GF", "GG", "GH", "GI", "GL", "GM", "GN",
    "GP", "GQ", "GR", "GS", "GT", "GU", "GW", "GY", "HK", "HM", "HN", "HR", "HT", "HU", "ID",
    "IE", "IL", "IM", "IN", "IO", "IQ", "IR", "IS", "IT", "JE", "JM", "JO", "JP", "KE", "KG",
    "KH", "KI", "KM", "KN", "KP", "KR", "KW", "KY", "KZ", "LA", "LB", "LC", "LI", "LK", "LR",
    "LS", "LT", "LU", "LV", "LY", "MA", "MC", "MD", "ME", "MF", "MG", "MH", "MK", "ML", "MM",
    "MN", "MO", "MP", "MQ", "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA", "NC",
    "NE", "NF", "NG", "NI", "NL", "NO", "NP", "NR", "NU", "NZ", "OM", "PA", "PE", "PF", "PG",
    "PH", "PK", "PL", "PM", "PN", "PR", "PS", "PT", "PW", "PY", "QA", "RE", "RO", "RS", "RU",
    "RW", "SA", "SB", "SC", "SD", "SE", "SG", "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO",
    "SR", "SS", "ST", "SV", "SX", "SY", "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TL",
    "TM", "TN", "TO", "TR", "TT", "TV", "TW", "TZ", "UA", "UG", "UM", "US", "UY", "UZ", "VA",
    "VC", "VE", "VG", "VI", "VN", "VU", "WF", "WS", "Worldwide", "YE", "YT", "ZA", "ZM", "ZW",
];

/// ERN 4.2 territories: ISO codes (including withdrawn ones still in the AVS) plus
/// CISAC TIS numeric and regional codes.
pub const TERRITORY_CODES_42: &[&str] = &[
    "100", "104", "108", "112", "116", "12", "120", "124", "132", "140", "144", "148", "152",
    "156", "158", "170", "174", "178", "180", "188", "191", "192", "196", "20", "200", "203",
    "204", "208", "2100", "2101", "2102", "2103", "2104", "2105", "2106", "2107", "2108",
    "2109", "2110", "2111", "2112", "2113", "2114", "2115", "2116", "2117", "2118", "2119",
    "212", "2120", "2121", "2122", "2123", "2124", "2125", "2126", "2127", "2128", "2129",
    "2130", "2131", "2132", "2133", "2134", "2136", "214", "218", "222", "226", "230", "231",
    "232", "233", "24", "242", "246", "250", "258", "262", "266", "268", "270", "276", "278",
    "28", "280", "288", "296", "300", "308", "31", "32", "320", "324", "328", "332", "336",
    "340", "344", "348", "352", "356", "36", "360", "364", "368", "372", "376", "380", "384",
    "388", "392", "398", "4", "40", "400", "404", "408", "410", "414", "417", "418", "422",
    "426", "428", "430", "434", "438", "44", "440", "442", "446", "450", "454", "458", "462",
    "466", "470", "478", "48", "480", "484", "492", "496", "498", "499", "50", "504", "508",
    "51", "512", "516", "52", "520", "524", "528", "540", "548", "554", "558", "56", "562",
    "566", "578", "583", "584", "585", "586", "591", "598", "600", "604", "608", "616", "620",
    "624", "626", "630", "634", "64", "642", "643", "646", "659", "662", "670", "674", "678",
    "68", "682", "686", "688", "690", "694", "70", "702", "703", "704", "705", "706", "710",
    "716", "72", "720", "724", "728", "729", "732", "736", "740", "748", "752", "756", "76",
    "760", "762", "764", "768", "776", "780", "784", "788", "792", "795", "798", "8", "800",
    "804", "807", "810", "818", "826", "834", "84", "840", "854", "858", "860", "862", "882",
    "886", "887", "890", "891", "894", "90", "96", "AD", "AE", "AF", "AG", "AI", "AL", "AM",
    "AN", "AO", "AQ", "AR", "AS", "AT", "AU", "AW", "AX", "AZ", "BA", "BB", "BD", "BE", "BF",
    "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ", "BR", "BS", "BT", "BV", "BW", "BY",
    "BZ", "CA", "CC", "CD", "CF", "CG", "CH", "CI", "CK", "CL", "CM", "CN", "CO", "CR", "CS",
    "CU", "CV", "CW", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM", "DO", "DZ", "EC", "EE", "EG",
    "EH", "ER", "ES", "ES-CE", "ES-CN", "ES-ML", "ET", "FI", "FJ", "FK", "FM", "FO", "FR", "GA",
    "GB", "GD", "GE", "GF", "GG", "GH", "GI", "GL", "GM", "GN", "GP", "GQ", "GR", "GS", "GT",
    "GU", "GW", "GY", "HK", "HM", "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN", "IO",
    "IQ", "IR", "IS", "IT", "JE", "JM", "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN", "KP",
    "KR", "KW", "KY", "KZ", "LA", "LB", "LC", "LI", "LK", "LR", "LS", "LT", "LU", "LV", "LY",
    "MA", "MC", "MD", "ME", "MF", "MG", "MH", "MK", "ML", "MM", "MN", "MO", "MP", "MQ", "MR",
    "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA", "NC", "NE", "NF", "NG", "NI", "NL",
    "NO", "NP", "NR", "NU", "NZ", "OM", "PA", "PE", "PF", "PG", "PH", "PK", "PL", "PM", "PN",
    "PR", "PS", "PT", "PW", "PY", "QA", "RE", "RO", "RS", "RU", "RW", "SA", "SB", "SC", "SD",
    "SE", "SG", "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO", "SR", "SS", "ST", "SV", "SX",
    "SY", "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TL", "TM", "TN", "TO", "TR", "TT",
    "TV", "TW", "TZ", "UA", "UG", "UM", "US", "UY", "UZ", "VA", "VC", "VE", "VG", "VI", "VN",
    "VU", "WF", "WS", "Worldwide", "XK", "YE", "YT", "ZA", "ZM", "ZW",
];

/// `UseType` values allowed in ERN 4.x deal terms.
pub const USE_TYPES_4X: &[&str] = &[
    "AsPerContract", "Broadcast", "Cable", "ConditionalDownload", "ContentInfluencedStream",
    "Display", "Download", "Dub", "DubForAdvertisement", "DubForLivePerformance",
    "DubForMovies", "DubForMusicOnHold", "DubForOnDemandStreaming", "DubForPublicPerformance",
    "DubForRadio", "DubForTV", "ExtractForInternet", "KioskDownload", "Narrowcast",
    "NonInteractiveStream", "OnDemandStream", "Perform", "PerformAsMusicOnHold",
    "PerformInLivePerformance", "PerformInPublic", "PermanentDownload", "PlayInPublic",
    "Playback", "Podcast", "Print", "PrivateCopy", "PurchaseAsPhysicalProduct", "Rent",
    "Simulcast", "Stream", "TetheredDownload", "TimeInfluencedStream", "Unknown", "Use",
    "UseAsAlertTone", "UseAsDevice", "UseAsKaraoke", "UseAsRingbackTone", "UseAsRingbackTune",
    "UseAsRingtone", "UseAsRingtune", "UseAsScreensaver", "UseAsVoiceMail", "UseAsWallpaper",
    "UseForIdentification", "UseInMobilePhoneMessaging", "UseInPhoneListening", "UserDefined",
    "UserMakeAvailableLabelProvided", "UserMakeAvailableUserProvided", "Webcast",
];

/// `Usage/UseType` values allowed in ERN 3.8.2 deal terms.
pub const USE_TYPES_382: &[&str] = &[
    "AsPerContract", "ConditionalDownload", "ContentInfluencedStream", "NonInteractiveStream",
    "OnDemandStream", "PermanentDownload", "PurchaseAsPhysicalProduct", "TetheredDownload",
    "TimeInfluencedStream", "Unknown", "UseAsAlertTone", "UseAsRingbackTone", "UseAsRingtone",
    "UserDefined",
];

/// `CommercialModelType` values for ERN 4.x.
pub const COMMERCIAL_MODELS_4X: &[&str] = &[
    "AdvertisementSupportedModel", "AsPerContract", "DeviceFeeModel", "FreeOfChargeModel",
    "PayAsYouGoModel", "PerformanceRoyaltiesModel", "RightsClaimModel", "SubscriptionModel",
    "Unknown", "UserDefined",
];

/// `CommercialModelType` values for ERN 3.8.2.
pub const COMMERCIAL_MODELS_382: &[&str] = &[
    "AdvertisementSupportedModel", "AsPerContract", "PayAsYouGoModel", "PermanentDownloadModel",
    "RentalModel", "SubscriptionModel", "UserDefined",
];

/// `ReleaseType` values for ERN 4.x.
pub const RELEASE_TYPES_4X: &[&str] = &[
    "Album", "AlertToneRelease", "AsPerContract", "AudioBookRelease", "AudioDramaRelease",
    "BackCoverImageRelease", "BookletBackImageRelease", "BookletFrontImageRelease",
    "BookletRelease", "Bundle", "ClassicalAlbum", "ClassicalDigitalBoxedSet",
    "ClassicalMultimediaAlbum", "ConcertVideo", "DigitalBoxSetRelease", "DjMix", "Documentary",
    "Drama", "DramaticoMusicalVideoRelease", "EBookRelease", "EP", "Episode", "FeatureFilm",
    "KaraokeRelease", "LiveEventVideo", "LogoRelease", "LongFormMusicalWorkVideoRelease",
    "LongFormNonMusicalWorkVideoRelease", "LyricSheetRelease", "MultimediaAlbum",
    "MultimediaDigitalBoxedSet", "MultimediaSingle", "MusicalWorkBasedGameRelease",
    "NonMusicalWorkBasedGameRelease", "PlayList", "RingbackToneRelease", "RingtoneRelease",
    "Season", "Series", "SheetMusicRelease", "ShortFilm", "Single", "SingleResourceRelease",
    "StemBundle", "TrackRelease", "UserDefined", "VideoAlbum", "VideoMastertoneRelease",
    "VideoSingle", "WallpaperRelease",
];

/// `DisplayArtistRole` values.
pub const DISPLAY_ARTIST_ROLES: &[&str] = &[
    "Artist", "Brand", "Composer", "FeaturedArtist", "MainArtist", "Unknown", "UserDefined",
];

/// Contributor role values.
pub const CONTRIBUTOR_ROLES: &[&str] = &[
    "Actor", "Adapter", "Arranger", "ArtistBackgroundVocalEngineer", "AssistantEngineer",
    "AssociatedPerformer", "Author", "BackgroundVocalist", "Band", "Choir", "ChoirMember",
    "Compiler", "Composer", "ComposerLyricist", "Conductor", "DJ", "Engineer", "Ensemble",
    "FeaturedArtist", "Librettist", "Lyricist", "MainArtist", "MasteringEngineer", "Mixer",
    "MixingEngineer", "MusicPublisher", "MusicalDirector", "Orchestra", "OrchestraMember",
    "Performer", "Producer", "Programmer", "RecordingEngineer", "Remixer", "Soloist",
    "SoundEngineer", "StudioMusician", "StudioPersonnel", "StudioProducer", "Translator",
    "Unknown", "UserDefined", "Vocalist", "Writer",
];

/// Umbrella use types superseded by their specific children.
pub const DEPRECATED_USE_TYPES: &[&str] = &[
    "Broadcast", "Download", "Stream",
];

pub const MESSAGE_CONTROL_TYPES: &[&str] = &[
    "LiveMessage", "TestMessage",
];

/// Image codecs considered standard for cover art.
pub const IMAGE_CODECS: &[&str] = &[
    "GIF", "JPEG", "PNG", "TIFF",
];

/// Parent use types and the specific children that may not appear alongside them.
pub const USE_TYPE_CHILDREN: &[(&str, &[&str])] = &[
    (
        "Broadcast",
        &["Cable", "Narrowcast", "Simulcast", "Webcast"],
    ),
    (
        "Download",
        &[
            "ConditionalDownload",
            "KioskDownload",
            "PermanentDownload",
            "TetheredDownload",
        ],
    ),
    (
        "Stream",
        &[
            "ContentInfluencedStream",
            "NonInteractiveStream",
            "OnDemandStream",
            "TimeInfluencedStream",
        ],
    ),
];

/// Membership test against one of the sorted tables above.
pub fn contains(table: &[&str], value: &str) -> bool {
    table.binary_search(&value).is_ok()
}

/// Children of `parent` that conflict with it, if `parent` is an umbrella use type.
pub fn use_type_children(parent: &str) -> &'static [&'static str] {
    USE_TYPE_CHILDREN
        .iter()
        .find(|(p, _)| *p == parent)
        .map(|(_, children)| *children)
        .unwrap_or(&[])
}
