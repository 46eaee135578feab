mod chunk_helpers;
