//! Word lists for slugs, titles and generated sub-category names.

pub static ADJECTIVES: &[&str] = &[
    "abstract", "ancient", "artistic", "beautiful", "bold", "bright", "classic", "clean",
    "colorful", "creative", "cute", "dark", "decorative", "delicate", "elegant", "fancy",
    "festive", "floral", "fresh", "fun", "geometric", "golden", "gorgeous", "graceful",
    "handmade", "happy", "luxury", "magical", "minimal", "modern", "natural", "organic",
    "ornate", "playful", "premium", "pretty", "retro", "rustic", "seasonal", "simple",
    "stylish", "trendy", "unique", "urban", "vibrant", "vintage", "wild", "wonderful",
];

pub static NOUNS: &[&str] = &[
    "art", "background", "badge", "banner", "border", "bouquet", "card", "celebration",
    "collection", "decoration", "design", "drawing", "element", "emblem", "flower", "frame",
    "graphic", "icon", "illustration", "image", "label", "layout", "logo", "ornament",
    "pattern", "poster", "print", "set", "shape", "sign", "silhouette", "sketch",
    "sticker", "style", "symbol", "template", "texture", "theme", "vector", "wallpaper",
    "watercolor", "wreath", "bundle", "pack", "kit", "clipart", "mockup", "scene",
];

pub static SUBCATEGORY_PREFIXES: &[&str] = &[
    "modern", "vintage", "classic", "premium", "professional", "creative", "elegant", "bold",
    "minimal", "decorative",
];

pub static SUBCATEGORY_SUFFIXES: &[&str] = &[
    "designs", "templates", "graphics", "elements", "patterns", "styles", "collections",
    "sets", "packs", "kits",
];

pub static PROMO_TYPES: &[&str] = &["discount", "featured", "bundle", "seasonal", "flash-sale"];

pub static PROMO_STATUSES: &[&str] = &["active", "scheduled", "expired", "paused"];
